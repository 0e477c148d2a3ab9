//! Delivery and Payment Methods Repository

use spareline::{
    orders::{DeliveryMethodSnapshot, PaymentMethodSnapshot},
    uuids::{DeliveryMethodUuid, PaymentMethodUuid},
};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::database::try_get_amount;

const GET_DELIVERY_METHOD_SQL: &str = include_str!("../sql/get_delivery_method.sql");
const GET_PAYMENT_METHOD_SQL: &str = include_str!("../sql/get_payment_method.sql");

struct DeliveryMethodRow(DeliveryMethodSnapshot);

struct PaymentMethodRow(PaymentMethodSnapshot);

#[derive(Debug, Clone, Default)]
pub(crate) struct PgMethodsRepository;

impl PgMethodsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn delivery(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: DeliveryMethodUuid,
    ) -> Result<Option<DeliveryMethodSnapshot>, sqlx::Error> {
        let row = query_as::<Postgres, DeliveryMethodRow>(GET_DELIVERY_METHOD_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(row.map(|row| row.0))
    }

    pub(crate) async fn payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: PaymentMethodUuid,
    ) -> Result<Option<PaymentMethodSnapshot>, sqlx::Error> {
        let row = query_as::<Postgres, PaymentMethodRow>(GET_PAYMENT_METHOD_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(row.map(|row| row.0))
    }
}

impl<'r> FromRow<'r, PgRow> for DeliveryMethodRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(DeliveryMethodSnapshot {
            uuid: DeliveryMethodUuid::from_uuid(row.try_get("uuid")?),
            price: try_get_amount(row, "price")?,
            is_active: row.try_get("is_active")?,
        }))
    }
}

impl<'r> FromRow<'r, PgRow> for PaymentMethodRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(PaymentMethodSnapshot {
            uuid: PaymentMethodUuid::from_uuid(row.try_get("uuid")?),
            is_active: row.try_get("is_active")?,
        }))
    }
}
