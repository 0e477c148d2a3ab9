//! Order Requests

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline::{
    orders::{Checkout, InlineOffer, ManagerLineInput, ManagerOrderInput},
    uuids::{OfferUuid, ProductUuid},
};

/// Checkout Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutRequest {
    pub delivery_method_uuid: Uuid,
    pub payment_method_uuid: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_address: Option<String>,
    pub comment: Option<String>,

    /// Overrides the code stored on the cart
    pub promo_code: Option<String>,
}

impl From<CheckoutRequest> for Checkout {
    fn from(request: CheckoutRequest) -> Self {
        Self {
            delivery_method: request.delivery_method_uuid.into(),
            payment_method: request.payment_method_uuid.into(),
            customer_name: request.customer_name,
            customer_phone: request.customer_phone,
            customer_email: request.customer_email,
            delivery_address: request.delivery_address,
            comment: request.comment,
            promo_code: request.promo_code,
        }
    }
}

/// Offer created on the fly for a manager order line
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct InlineOfferRequest {
    pub name: String,
    pub product_uuid: Option<Uuid>,
    pub delivery_days: Option<u32>,

    #[serde(default)]
    pub is_original: bool,

    #[serde(default)]
    pub is_analog: bool,
}

/// Manager order line. Set exactly one of `product_uuid`, `offer_uuid` and `inline`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ManagerLineRequest {
    pub product_uuid: Option<Uuid>,
    pub offer_uuid: Option<Uuid>,
    pub inline: Option<InlineOfferRequest>,
    pub quantity: u32,

    /// Unit price in kopecks
    pub price: u64,
}

impl From<ManagerLineRequest> for ManagerLineInput {
    fn from(request: ManagerLineRequest) -> Self {
        Self {
            product: request.product_uuid.map(ProductUuid::from),
            offer: request.offer_uuid.map(OfferUuid::from),
            inline: request.inline.map(|inline| InlineOffer {
                name: inline.name,
                product: inline.product_uuid.map(ProductUuid::from),
                delivery_days: inline.delivery_days,
                is_original: inline.is_original,
                is_analog: inline.is_analog,
            }),
            quantity: request.quantity,
            price: request.price,
        }
    }
}

/// Manager Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ManagerOrderRequest {
    /// The customer is found by phone or registered
    pub customer_phone: String,

    pub customer_name: String,
    pub customer_email: Option<String>,
    pub delivery_method_uuid: Uuid,
    pub payment_method_uuid: Uuid,
    pub delivery_address: Option<String>,
    pub comment: Option<String>,
    pub items: Vec<ManagerLineRequest>,
}

impl From<ManagerOrderRequest> for ManagerOrderInput {
    fn from(request: ManagerOrderRequest) -> Self {
        Self {
            customer_phone: request.customer_phone,
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            delivery_method: request.delivery_method_uuid.into(),
            payment_method: request.payment_method_uuid.into(),
            delivery_address: request.delivery_address,
            comment: request.comment,
            items: request.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Update Order Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateOrderStatusRequest {
    pub status_uuid: Uuid,
}
