//! Order Records

use jiff::Timestamp;
use spareline::{
    cart::CartLineKey,
    orders::OrderTotals,
    uuids::{DeliveryMethodUuid, OrderStatusUuid, PaymentMethodUuid, TypedUuid, UserUuid},
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order item UUID
pub type OrderItemUuid = TypedUuid<OrderItemRecord>;

/// The status an order is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusRecord {
    pub uuid: OrderStatusUuid,
    pub code: String,
    pub name: String,
}

/// A frozen order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRecord {
    pub uuid: OrderItemUuid,
    pub order_uuid: OrderUuid,
    pub key: CartLineKey,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub line_total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,

    /// `YYYYMMDD-NNNN`
    pub number: String,

    pub user_uuid: UserUuid,
    pub status: OrderStatusRecord,
    pub delivery_method_uuid: DeliveryMethodUuid,
    pub payment_method_uuid: PaymentMethodUuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_address: Option<String>,
    pub comment: Option<String>,
    pub promo_code: Option<String>,
    pub totals: OrderTotals,
    pub is_manager_created: bool,
    pub created_by_manager_uuid: Option<UserUuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub items: Vec<OrderItemRecord>,
}

/// Everything written to the `orders` row.
#[derive(Debug, Clone)]
pub(crate) struct NewOrder {
    pub uuid: OrderUuid,
    pub number: String,
    pub user: UserUuid,
    pub status: OrderStatusUuid,
    pub delivery_method: DeliveryMethodUuid,
    pub payment_method: PaymentMethodUuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_address: Option<String>,
    pub comment: Option<String>,
    pub promo_code: Option<String>,
    pub totals: OrderTotals,

    /// Set for manager-authored orders
    pub manager: Option<UserUuid>,
}
