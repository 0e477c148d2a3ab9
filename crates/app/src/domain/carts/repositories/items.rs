//! Cart Items Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use spareline::{
    cart::{CartLine, CartLineKey, LineSource, OfferSnapshot, ProductSnapshot},
    offers::OfferState,
    uuids::{OfferUuid, ProductUuid},
};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::{quantity_param, try_get_amount, try_get_quantity},
    domain::carts::records::{CartItemUuid, CartUuid},
};

const GET_CART_LINES_SQL: &str = include_str!("../sql/get_cart_lines.sql");
const GET_CART_QUANTITIES_SQL: &str = include_str!("../sql/get_cart_quantities.sql");
const LOCK_CART_OFFERS_SQL: &str = include_str!("../sql/lock_cart_offers.sql");
const ADD_CART_PRODUCT_SQL: &str = include_str!("../sql/add_cart_product.sql");
const ADD_CART_OFFER_SQL: &str = include_str!("../sql/add_cart_offer.sql");
const PUT_CART_PRODUCT_SQL: &str = include_str!("../sql/put_cart_product.sql");
const PUT_CART_OFFER_SQL: &str = include_str!("../sql/put_cart_offer.sql");
const SET_CART_ITEM_QUANTITY_SQL: &str = include_str!("../sql/set_cart_item_quantity.sql");
const DELETE_CART_ITEM_SQL: &str = include_str!("../sql/delete_cart_item.sql");
const CLEAR_CART_ITEMS_SQL: &str = include_str!("../sql/clear_cart_items.sql");

/// Row wrapper so the engine's [`CartLine`] can be decoded.
struct CartLineRow(CartLine);

/// Line key and quantity only.
struct QuantityRow(CartLineKey, u32);

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Every line of `cart` joined with its live product or offer.
    pub(crate) async fn lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Vec<CartLine>, sqlx::Error> {
        let rows = query_as::<Postgres, CartLineRow>(GET_CART_LINES_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    pub(crate) async fn quantities(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Vec<(CartLineKey, u32)>, sqlx::Error> {
        let rows = query_as::<Postgres, QuantityRow>(GET_CART_QUANTITIES_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows.into_iter().map(|row| (row.0, row.1)).collect())
    }

    /// Lock every offer referenced by `cart`, in uuid order.
    pub(crate) async fn lock_offers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Vec<OfferUuid>, sqlx::Error> {
        let uuids: Vec<Uuid> = query_scalar(LOCK_CART_OFFERS_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(uuids.into_iter().map(OfferUuid::from_uuid).collect())
    }

    /// Add `quantity` to the line for `key`, creating it when absent.
    pub(crate) async fn add(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        key: CartLineKey,
        quantity: u32,
    ) -> Result<(), sqlx::Error> {
        let sql = match key {
            CartLineKey::Product(_) => ADD_CART_PRODUCT_SQL,
            CartLineKey::Offer(_) => ADD_CART_OFFER_SQL,
        };

        self.upsert(tx, sql, cart, key, quantity).await
    }

    /// Set the line for `key` to exactly `quantity`, creating it when absent.
    pub(crate) async fn put(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        key: CartLineKey,
        quantity: u32,
    ) -> Result<(), sqlx::Error> {
        let sql = match key {
            CartLineKey::Product(_) => PUT_CART_PRODUCT_SQL,
            CartLineKey::Offer(_) => PUT_CART_OFFER_SQL,
        };

        self.upsert(tx, sql, cart, key, quantity).await
    }

    async fn upsert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sql: &'static str,
        cart: CartUuid,
        key: CartLineKey,
        quantity: u32,
    ) -> Result<(), sqlx::Error> {
        query(sql)
            .bind(CartItemUuid::new().into_uuid())
            .bind(cart.into_uuid())
            .bind(key.uuid())
            .bind(quantity_param(quantity)?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Change an existing line. Returns whether the line existed.
    pub(crate) async fn set_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        key: CartLineKey,
        quantity: u32,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(SET_CART_ITEM_QUANTITY_SQL)
            .bind(cart.into_uuid())
            .bind(key.product().map(ProductUuid::into_uuid))
            .bind(key.offer().map(OfferUuid::into_uuid))
            .bind(quantity_param(quantity)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    pub(crate) async fn remove(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        key: CartLineKey,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(key.product().map(ProductUuid::into_uuid))
            .bind(key.offer().map(OfferUuid::into_uuid))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn clear(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_CART_ITEMS_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn try_get_key(row: &PgRow) -> Result<CartLineKey, sqlx::Error> {
    let product: Option<Uuid> = row.try_get("product_uuid")?;
    let offer: Option<Uuid> = row.try_get("offer_uuid")?;

    match (product, offer) {
        (Some(product), None) => Ok(CartLineKey::Product(ProductUuid::from_uuid(product))),
        (None, Some(offer)) => Ok(CartLineKey::Offer(OfferUuid::from_uuid(offer))),
        _ => Err(sqlx::Error::ColumnDecode {
            index: "product_uuid".to_string(),
            source: "cart line must reference exactly one product or offer".into(),
        }),
    }
}

fn try_get_source(row: &PgRow, key: CartLineKey) -> Result<LineSource, sqlx::Error> {
    match key {
        CartLineKey::Product(uuid) => {
            if row.try_get::<Option<Uuid>, _>("product_found")?.is_none() {
                return Ok(LineSource::Missing);
            }

            Ok(LineSource::Product(ProductSnapshot {
                uuid,
                name: row.try_get("product_name")?,
                price: try_get_amount(row, "product_price")?,
                is_active: row.try_get("product_is_active")?,
                in_stock: row.try_get("product_in_stock")?,
                exclude_from_promo_codes: row.try_get("exclude_from_promo_codes")?,
            }))
        }
        CartLineKey::Offer(uuid) => {
            if row.try_get::<Option<Uuid>, _>("offer_found")?.is_none() {
                return Ok(LineSource::Missing);
            }

            Ok(LineSource::Offer(OfferSnapshot {
                uuid,
                name: row.try_get("offer_name")?,
                price: try_get_amount(row, "offer_price")?,
                state: OfferState {
                    is_active: row.try_get("offer_is_active")?,
                    is_cancelled: row.try_get("offer_is_cancelled")?,
                    expires_at: row
                        .try_get::<Option<SqlxTimestamp>, _>("offer_expires_at")?
                        .map(SqlxTimestamp::to_jiff),
                    consumed_at: row
                        .try_get::<Option<SqlxTimestamp>, _>("offer_consumed_at")?
                        .map(SqlxTimestamp::to_jiff),
                },
            }))
        }
    }
}

impl<'r> FromRow<'r, PgRow> for CartLineRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let key = try_get_key(row)?;

        Ok(Self(CartLine {
            key,
            quantity: try_get_quantity(row, "quantity")?,
            source: try_get_source(row, key)?,
        }))
    }
}

impl<'r> FromRow<'r, PgRow> for QuantityRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(try_get_key(row)?, try_get_quantity(row, "quantity")?))
    }
}
