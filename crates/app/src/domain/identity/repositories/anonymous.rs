//! Anonymous Users Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use spareline::uuids::{AnonymousUuid, UserUuid};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::identity::records::AnonymousUserRecord;

const CREATE_ANONYMOUS_USER_SQL: &str = include_str!("../sql/create_anonymous_user.sql");
const FIND_ANONYMOUS_USER_SQL: &str = include_str!("../sql/find_anonymous_user.sql");
const LOCK_ANONYMOUS_USER_SQL: &str = include_str!("../sql/lock_anonymous_user.sql");
const RETIRE_ANONYMOUS_USER_SQL: &str = include_str!("../sql/retire_anonymous_user.sql");
const SHARE_ANONYMOUS_USER_SQL: &str = include_str!("../sql/share_anonymous_user.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAnonymousUsersRepository;

impl PgAnonymousUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: AnonymousUuid,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<AnonymousUserRecord, sqlx::Error> {
        query_as::<Postgres, AnonymousUserRecord>(CREATE_ANONYMOUS_USER_SQL)
            .bind(uuid.into_uuid())
            .bind(token_hash)
            .bind(SqlxTimestamp::from(expires_at))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: AnonymousUuid,
    ) -> Result<Option<AnonymousUserRecord>, sqlx::Error> {
        query_as::<Postgres, AnonymousUserRecord>(FIND_ANONYMOUS_USER_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn lock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: AnonymousUuid,
    ) -> Result<Option<AnonymousUserRecord>, sqlx::Error> {
        query_as::<Postgres, AnonymousUserRecord>(LOCK_ANONYMOUS_USER_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Read a visitor under a share lock, so a concurrent merge either finishes first
    /// or waits for the caller's transaction.
    pub(crate) async fn share(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: AnonymousUuid,
    ) -> Result<Option<AnonymousUserRecord>, sqlx::Error> {
        query_as::<Postgres, AnonymousUserRecord>(SHARE_ANONYMOUS_USER_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Retire an anonymous identity into `user`. Returns `false` if it was already retired.
    pub(crate) async fn retire(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: AnonymousUuid,
        user: UserUuid,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(RETIRE_ANONYMOUS_USER_SQL)
            .bind(uuid.into_uuid())
            .bind(user.into_uuid())
            .bind(SqlxTimestamp::from(at))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}

impl<'r> FromRow<'r, PgRow> for AnonymousUserRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: AnonymousUuid::from_uuid(row.try_get("uuid")?),
            token_hash: row.try_get("token_hash")?,
            expires_at: row.try_get::<SqlxTimestamp, _>("expires_at")?.to_jiff(),
            retired_at: row
                .try_get::<Option<SqlxTimestamp>, _>("retired_at")?
                .map(SqlxTimestamp::to_jiff),
            merged_into_user_uuid: row
                .try_get::<Option<Uuid>, _>("merged_into_user_uuid")?
                .map(UserUuid::from_uuid),
        })
    }
}
