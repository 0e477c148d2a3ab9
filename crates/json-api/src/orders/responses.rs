//! Order Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline_app::domain::orders::records::{OrderItemRecord, OrderRecord};

/// Order status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderStatusResponse {
    pub uuid: Uuid,
    pub code: String,
    pub name: String,
}

/// Order Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    pub uuid: Uuid,

    /// `product` or `offer`
    pub kind: String,

    /// Product or offer the line was frozen from
    pub item_uuid: Uuid,

    pub name: String,

    /// Unit price in kopecks at order time
    pub unit_price: u64,

    pub quantity: u32,
    pub line_total: u64,
}

impl From<OrderItemRecord> for OrderItemResponse {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            uuid: item.uuid.into_uuid(),
            kind: item.key.kind().as_str().to_string(),
            item_uuid: item.key.uuid(),
            name: item.name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            line_total: item.line_total,
        }
    }
}

/// Order Response
///
/// Amounts are in kopecks; `total` is `subtotal - discount + delivery`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,

    /// `YYYYMMDD-NNNN`
    pub number: String,

    pub user_uuid: Uuid,
    pub status: OrderStatusResponse,
    pub delivery_method_uuid: Uuid,
    pub payment_method_uuid: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_address: Option<String>,
    pub comment: Option<String>,
    pub promo_code: Option<String>,
    pub subtotal: u64,
    pub discount: u64,
    pub delivery: u64,
    pub total: u64,
    pub is_manager_created: bool,
    pub created_by_manager_uuid: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            uuid: order.uuid.into_uuid(),
            number: order.number,
            user_uuid: order.user_uuid.into_uuid(),
            status: OrderStatusResponse {
                uuid: order.status.uuid.into_uuid(),
                code: order.status.code,
                name: order.status.name,
            },
            delivery_method_uuid: order.delivery_method_uuid.into_uuid(),
            payment_method_uuid: order.payment_method_uuid.into_uuid(),
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            customer_email: order.customer_email,
            delivery_address: order.delivery_address,
            comment: order.comment,
            promo_code: order.promo_code,
            subtotal: order.totals.subtotal,
            discount: order.totals.discount,
            delivery: order.totals.delivery,
            total: order.totals.total,
            is_manager_created: order.is_manager_created,
            created_by_manager_uuid: order.created_by_manager_uuid.map(|uuid| uuid.into_uuid()),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use jiff::Timestamp;
    use spareline::{
        cart::CartLineKey,
        orders::OrderTotals,
        uuids::{ProductUuid, UserUuid},
    };
    use spareline_app::domain::orders::records::{
        OrderItemRecord, OrderItemUuid, OrderRecord, OrderStatusRecord, OrderUuid,
    };
    use uuid::Uuid;

    /// A placed order with one product line.
    pub(crate) fn order(user: UserUuid) -> OrderRecord {
        let uuid = OrderUuid::from_uuid(Uuid::from_u128(500));

        OrderRecord {
            uuid,
            number: "20261018-0001".to_string(),
            user_uuid: user,
            status: OrderStatusRecord {
                uuid: Uuid::from_u128(600).into(),
                code: "new".to_string(),
                name: "New".to_string(),
            },
            delivery_method_uuid: Uuid::from_u128(700).into(),
            payment_method_uuid: Uuid::from_u128(800).into(),
            customer_name: "Ivan".to_string(),
            customer_phone: "+79990000001".to_string(),
            customer_email: None,
            delivery_address: Some("Moscow".to_string()),
            comment: None,
            promo_code: None,
            totals: OrderTotals {
                subtotal: 90_000,
                discount: 0,
                delivery: 50_000,
                total: 140_000,
            },
            is_manager_created: false,
            created_by_manager_uuid: None,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            items: vec![OrderItemRecord {
                uuid: OrderItemUuid::from_uuid(Uuid::from_u128(501)),
                order_uuid: uuid,
                key: CartLineKey::Product(ProductUuid::from_uuid(Uuid::from_u128(11))),
                name: "Oil filter".to_string(),
                unit_price: 45_000,
                quantity: 2,
                line_total: 90_000,
            }],
        }
    }
}
