//! Offers Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use spareline::{
    offers::NewOffer,
    uuids::{OfferUuid, ProductUuid, UserUuid},
};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{amount_param, try_get_amount, try_get_optional_amount},
    domain::{offers::records::OfferRecord, orders::records::OrderUuid},
};

const CREATE_OFFER_SQL: &str = include_str!("sql/create_offer.sql");
const GET_OFFER_SQL: &str = include_str!("sql/get_offer.sql");
const LOCK_OFFER_SQL: &str = include_str!("sql/lock_offer.sql");
const UPDATE_OFFER_SQL: &str = include_str!("sql/update_offer.sql");
const DEACTIVATE_OFFER_SQL: &str = include_str!("sql/deactivate_offer.sql");
const CANCEL_OFFER_SQL: &str = include_str!("sql/cancel_offer.sql");
const CONSUME_OFFERS_SQL: &str = include_str!("sql/consume_offers.sql");

/// The order an offer is created already consumed by.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Consumption {
    pub order: OrderUuid,
    pub at: Timestamp,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOffersRepository;

impl PgOffersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OfferUuid,
        created_by: UserUuid,
        offer: &NewOffer,
        consumed: Option<Consumption>,
    ) -> Result<OfferRecord, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(CREATE_OFFER_SQL)
            .bind(uuid.into_uuid())
            .bind(offer.product.map(ProductUuid::into_uuid))
            .bind(offer.customer.map(UserUuid::into_uuid))
            .bind(created_by.into_uuid())
            .bind(&offer.name)
            .bind(offer.description.as_deref())
            .bind(amount_param(offer.price)?)
            .bind(offer.old_price.map(amount_param).transpose()?)
            .bind(offer.delivery_days.map(days_param).transpose()?)
            .bind(offer.is_original)
            .bind(offer.is_analog)
            .bind(offer.expires_at.map(SqlxTimestamp::from))
            .bind(consumed.map(|c| SqlxTimestamp::from(c.at)))
            .bind(consumed.map(|c| c.order.into_uuid()))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OfferUuid,
    ) -> Result<Option<OfferRecord>, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(GET_OFFER_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Fetch an offer and hold its row lock until the transaction ends.
    pub(crate) async fn lock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OfferUuid,
    ) -> Result<Option<OfferRecord>, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(LOCK_OFFER_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OfferUuid,
        offer: &NewOffer,
    ) -> Result<OfferRecord, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(UPDATE_OFFER_SQL)
            .bind(uuid.into_uuid())
            .bind(&offer.name)
            .bind(offer.description.as_deref())
            .bind(amount_param(offer.price)?)
            .bind(offer.old_price.map(amount_param).transpose()?)
            .bind(offer.delivery_days.map(days_param).transpose()?)
            .bind(offer.is_original)
            .bind(offer.is_analog)
            .bind(offer.expires_at.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn deactivate(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OfferUuid,
    ) -> Result<OfferRecord, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(DEACTIVATE_OFFER_SQL)
            .bind(uuid.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn cancel(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OfferUuid,
    ) -> Result<OfferRecord, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(CANCEL_OFFER_SQL)
            .bind(uuid.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Mark `offers` bought by `order`. Returns how many were still unconsumed.
    pub(crate) async fn consume(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offers: &[OfferUuid],
        order: OrderUuid,
        at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let uuids: Vec<Uuid> = offers.iter().map(|offer| offer.into_uuid()).collect();

        let result = query(CONSUME_OFFERS_SQL)
            .bind(uuids)
            .bind(order.into_uuid())
            .bind(SqlxTimestamp::from(at))
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }
}

fn days_param(days: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(days).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

fn try_get_days(row: &PgRow, col: &str) -> Result<Option<u32>, sqlx::Error> {
    let days: Option<i32> = row.try_get(col)?;

    days.map(u32::try_from)
        .transpose()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: col.to_string(),
            source: Box::new(e),
        })
}

impl<'r> FromRow<'r, PgRow> for OfferRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OfferUuid::from_uuid(row.try_get("uuid")?),
            product_uuid: row
                .try_get::<Option<Uuid>, _>("product_uuid")?
                .map(ProductUuid::from_uuid),
            customer_uuid: row
                .try_get::<Option<Uuid>, _>("customer_uuid")?
                .map(UserUuid::from_uuid),
            created_by_uuid: UserUuid::from_uuid(row.try_get("created_by_uuid")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: try_get_amount(row, "price")?,
            old_price: try_get_optional_amount(row, "old_price")?,
            delivery_days: try_get_days(row, "delivery_days")?,
            is_original: row.try_get("is_original")?,
            is_analog: row.try_get("is_analog")?,
            is_active: row.try_get("is_active")?,
            is_cancelled: row.try_get("is_cancelled")?,
            expires_at: row
                .try_get::<Option<SqlxTimestamp>, _>("expires_at")?
                .map(SqlxTimestamp::to_jiff),
            consumed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("consumed_at")?
                .map(SqlxTimestamp::to_jiff),
            consumed_by_order_uuid: row
                .try_get::<Option<Uuid>, _>("consumed_by_order_uuid")?
                .map(OrderUuid::from_uuid),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
