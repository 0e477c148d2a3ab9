//! Order Numbers Repository

use jiff::civil::Date;
use spareline::orders;
use sqlx::{Postgres, Transaction, query_scalar};

const NEXT_ORDER_SEQUENCE_SQL: &str = include_str!("../sql/next_order_sequence.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderNumbersRepository;

impl PgOrderNumbersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Allocate the next order number for `day`.
    ///
    /// The sequence row stays locked until the transaction ends, so numbers are
    /// handed out in commit order without gaps from concurrent checkouts.
    pub(crate) async fn next(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        day: Date,
    ) -> Result<String, sqlx::Error> {
        let sequence: i32 = query_scalar(NEXT_ORDER_SEQUENCE_SQL)
            .bind(day.to_string())
            .fetch_one(&mut **tx)
            .await?;

        let sequence = u32::try_from(sequence).map_err(|e| sqlx::Error::ColumnDecode {
            index: "last_value".to_string(),
            source: Box::new(e),
        })?;

        Ok(orders::order_number(day, sequence))
    }
}
