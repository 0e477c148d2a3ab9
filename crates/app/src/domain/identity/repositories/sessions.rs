//! Sessions Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use spareline::{identity::AuthenticatedUser, uuids::UserUuid};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::identity::{
    records::{SessionRecord, SessionUuid},
    repositories::users::try_get_role,
};

const CREATE_SESSION_SQL: &str = include_str!("../sql/create_session.sql");
const FIND_ACTIVE_SESSION_SQL: &str = include_str!("../sql/find_active_session.sql");
const TOUCH_SESSION_SQL: &str = include_str!("../sql/touch_session.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSessionsRepository;

impl PgSessionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: SessionUuid,
        user: UserUuid,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_SESSION_SQL)
            .bind(uuid.into_uuid())
            .bind(user.into_uuid())
            .bind(token_hash)
            .bind(SqlxTimestamp::from(expires_at))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Find an unrevoked session that is still valid at `now`.
    pub(crate) async fn find_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: SessionUuid,
        now: Timestamp,
    ) -> Result<Option<SessionRecord>, sqlx::Error> {
        query_as::<Postgres, SessionRecord>(FIND_ACTIVE_SESSION_SQL)
            .bind(uuid.into_uuid())
            .bind(SqlxTimestamp::from(now))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn touch(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: SessionUuid,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        query(TOUCH_SESSION_SQL)
            .bind(uuid.into_uuid())
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for SessionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: SessionUuid::from_uuid(row.try_get("uuid")?),
            token_hash: row.try_get("token_hash")?,
            expires_at: row.try_get::<SqlxTimestamp, _>("expires_at")?.to_jiff(),
            user: AuthenticatedUser {
                uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
                phone: row.try_get("phone")?,
                role: try_get_role(row, "role")?,
            },
        })
    }
}
