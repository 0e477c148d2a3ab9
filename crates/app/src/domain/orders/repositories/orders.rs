//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rustc_hash::FxHashMap;
use spareline::{
    cart::CartLineKey,
    orders::{OrderLine, OrderTotals},
    uuids::{
        DeliveryMethodUuid, OfferUuid, OrderStatusUuid, PaymentMethodUuid, ProductUuid, UserUuid,
    },
};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{amount_param, quantity_param, try_get_amount, try_get_quantity},
    domain::orders::records::{
        NewOrder, OrderItemRecord, OrderItemUuid, OrderRecord, OrderStatusRecord, OrderUuid,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const CREATE_ORDER_ITEM_SQL: &str = include_str!("../sql/create_order_item.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LIST_USER_ORDERS_SQL: &str = include_str!("../sql/list_user_orders.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("../sql/get_order_items.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("../sql/update_order_status.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(&order.number)
            .bind(order.user.into_uuid())
            .bind(order.status.into_uuid())
            .bind(order.delivery_method.into_uuid())
            .bind(order.payment_method.into_uuid())
            .bind(&order.customer_name)
            .bind(&order.customer_phone)
            .bind(order.customer_email.as_deref())
            .bind(order.delivery_address.as_deref())
            .bind(order.comment.as_deref())
            .bind(order.promo_code.as_deref())
            .bind(amount_param(order.totals.subtotal)?)
            .bind(amount_param(order.totals.discount)?)
            .bind(amount_param(order.totals.delivery)?)
            .bind(amount_param(order.totals.total)?)
            .bind(order.manager.is_some())
            .bind(order.manager.map(UserUuid::into_uuid))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Write the frozen lines of `order`, keeping their order.
    pub(crate) async fn create_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        lines: &[OrderLine],
    ) -> Result<(), sqlx::Error> {
        for (position, line) in lines.iter().enumerate() {
            let position =
                i32::try_from(position).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

            query(CREATE_ORDER_ITEM_SQL)
                .bind(OrderItemUuid::new().into_uuid())
                .bind(order.into_uuid())
                .bind(line.key.product().map(ProductUuid::into_uuid))
                .bind(line.key.offer().map(OfferUuid::into_uuid))
                .bind(&line.name)
                .bind(amount_param(line.unit_price)?)
                .bind(quantity_param(line.quantity)?)
                .bind(amount_param(line.line_total)?)
                .bind(position)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    pub(crate) async fn get(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OrderUuid,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let order = query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(uuid.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let mut orders = self.with_items(tx, vec![order]).await?;

        Ok(orders.pop())
    }

    /// A user's orders, newest first.
    pub(crate) async fn list_for_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        let orders = query_as::<Postgres, OrderRecord>(LIST_USER_ORDERS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        self.with_items(tx, orders).await
    }

    pub(crate) async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: OrderUuid,
        status: OrderStatusUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(UPDATE_ORDER_STATUS_SQL)
            .bind(uuid.into_uuid())
            .bind(status.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut orders: Vec<OrderRecord>,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let uuids: Vec<Uuid> = orders.iter().map(|order| order.uuid.into_uuid()).collect();

        let items = query_as::<Postgres, OrderItemRecord>(GET_ORDER_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await?;

        let index: FxHashMap<OrderUuid, usize> = orders
            .iter()
            .enumerate()
            .map(|(position, order)| (order.uuid, position))
            .collect();

        for item in items {
            if let Some(order) = index
                .get(&item.order_uuid)
                .and_then(|&position| orders.get_mut(position))
            {
                order.items.push(item);
            }
        }

        Ok(orders)
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            number: row.try_get("number")?,
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            status: OrderStatusRecord {
                uuid: OrderStatusUuid::from_uuid(row.try_get("status_uuid")?),
                code: row.try_get("status_code")?,
                name: row.try_get("status_name")?,
            },
            delivery_method_uuid: DeliveryMethodUuid::from_uuid(
                row.try_get("delivery_method_uuid")?,
            ),
            payment_method_uuid: PaymentMethodUuid::from_uuid(row.try_get("payment_method_uuid")?),
            customer_name: row.try_get("customer_name")?,
            customer_phone: row.try_get("customer_phone")?,
            customer_email: row.try_get("customer_email")?,
            delivery_address: row.try_get("delivery_address")?,
            comment: row.try_get("comment")?,
            promo_code: row.try_get("promo_code")?,
            totals: OrderTotals {
                subtotal: try_get_amount(row, "subtotal_amount")?,
                discount: try_get_amount(row, "discount_amount")?,
                delivery: try_get_amount(row, "delivery_amount")?,
                total: try_get_amount(row, "total_amount")?,
            },
            is_manager_created: row.try_get("is_manager_created")?,
            created_by_manager_uuid: row
                .try_get::<Option<Uuid>, _>("created_by_manager_uuid")?
                .map(UserUuid::from_uuid),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            items: Vec::new(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let product: Option<Uuid> = row.try_get("product_uuid")?;
        let offer: Option<Uuid> = row.try_get("offer_uuid")?;

        let key = match (product, offer) {
            (Some(product), None) => CartLineKey::Product(ProductUuid::from_uuid(product)),
            (None, Some(offer)) => CartLineKey::Offer(OfferUuid::from_uuid(offer)),
            _ => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "product_uuid".to_string(),
                    source: "order item must reference exactly one product or offer".into(),
                });
            }
        };

        Ok(Self {
            uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            key,
            name: row.try_get("name")?,
            unit_price: try_get_amount(row, "unit_price")?,
            quantity: try_get_quantity(row, "quantity")?,
            line_total: try_get_amount(row, "line_total")?,
        })
    }
}
