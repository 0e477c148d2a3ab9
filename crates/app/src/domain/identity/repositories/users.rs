//! Users Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use spareline::{identity::Role, uuids::UserUuid};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::identity::records::UserRecord;

const FIND_USER_BY_PHONE_SQL: &str = include_str!("../sql/find_user_by_phone.sql");
const UPSERT_USER_BY_PHONE_SQL: &str = include_str!("../sql/upsert_user_by_phone.sql");
const SET_USER_ROLE_SQL: &str = include_str!("../sql/set_user_role.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgUsersRepository;

impl PgUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn find_by_phone(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        phone: &str,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        query_as::<Postgres, UserRecord>(FIND_USER_BY_PHONE_SQL)
            .bind(phone)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Find the user with `phone`, creating a customer when there is none.
    pub(crate) async fn find_or_create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        phone: &str,
        name: Option<&str>,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(UPSERT_USER_BY_PHONE_SQL)
            .bind(UserUuid::new().into_uuid())
            .bind(phone)
            .bind(name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        phone: &str,
        role: Role,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(SET_USER_ROLE_SQL)
            .bind(phone)
            .bind(role.as_str())
            .fetch_one(&mut **tx)
            .await
    }
}

pub(crate) fn try_get_role(row: &PgRow, col: &str) -> Result<Role, sqlx::Error> {
    let role: String = row.try_get(col)?;

    role.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, PgRow> for UserRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: UserUuid::from_uuid(row.try_get("uuid")?),
            phone: row.try_get("phone")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: try_get_role(row, "role")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
