//! Products Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use spareline::uuids::{BrandUuid, ProductUuid};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::{amount_param, try_get_amount},
    domain::catalog::records::{PricingUpdate, ProductRecord},
};

const GET_PRODUCT_SQL: &str = include_str!("../sql/get_product.sql");
const UPDATE_PRODUCT_PRICING_SQL: &str = include_str!("../sql/update_product_pricing.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: ProductUuid,
    ) -> Result<Option<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn update_pricing(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: ProductUuid,
        update: PricingUpdate,
    ) -> Result<ProductRecord, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(UPDATE_PRODUCT_PRICING_SQL)
            .bind(uuid.into_uuid())
            .bind(update.price.map(amount_param).transpose()?)
            .bind(update.is_active)
            .bind(update.in_stock)
            .bind(update.exclude_from_promo_codes)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            price: try_get_amount(row, "price")?,
            is_active: row.try_get("is_active")?,
            in_stock: row.try_get("in_stock")?,
            exclude_from_promo_codes: row.try_get("exclude_from_promo_codes")?,
            brand_uuid: row
                .try_get::<Option<Uuid>, _>("brand_uuid")?
                .map(BrandUuid::from_uuid),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
