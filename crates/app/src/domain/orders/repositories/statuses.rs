//! Order Statuses Repository

use spareline::{orders::StatusSnapshot, uuids::OrderStatusUuid};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

const GET_INITIAL_STATUS_SQL: &str = include_str!("../sql/get_initial_status.sql");
const GET_STATUS_SQL: &str = include_str!("../sql/get_status.sql");

struct StatusRow(StatusSnapshot);

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderStatusesRepository;

impl PgOrderStatusesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// The status new orders start in, if one is configured.
    pub(crate) async fn initial(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<StatusSnapshot>, sqlx::Error> {
        let row = query_as::<Postgres, StatusRow>(GET_INITIAL_STATUS_SQL)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(row.map(|row| row.0))
    }

    pub(crate) async fn get(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OrderStatusUuid,
    ) -> Result<Option<StatusSnapshot>, sqlx::Error> {
        let row = query_as::<Postgres, StatusRow>(GET_STATUS_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(row.map(|row| row.0))
    }
}

impl<'r> FromRow<'r, PgRow> for StatusRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(StatusSnapshot {
            uuid: OrderStatusUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            is_active: row.try_get("is_active")?,
            is_initial: row.try_get("is_initial")?,
            is_final: row.try_get("is_final")?,
        }))
    }
}
