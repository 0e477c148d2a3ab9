//! Cart Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline::{
    cart::{CartSummary, PricedLine},
    promo::PromoCodeInfo,
};
use spareline_app::domain::carts::records::CartView;

/// Promo code evaluation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PromoCodeInfoResponse {
    /// Normalised code
    pub code: String,

    /// Discount in kopecks, zero when the code does not apply
    pub discount_amount: u64,

    /// `FIXED_AMOUNT` or `PERCENTAGE`
    pub discount_type: String,

    /// Why the code does not apply
    pub error: Option<String>,
}

impl From<PromoCodeInfo> for PromoCodeInfoResponse {
    fn from(info: PromoCodeInfo) -> Self {
        Self {
            code: info.code,
            discount_amount: info.discount_amount,
            discount_type: info.discount_type.as_str().to_string(),
            error: info.error,
        }
    }
}

/// Cart Item Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartItemResponse {
    /// `product` or `offer`
    pub kind: String,

    /// Product or offer identifier
    pub uuid: Uuid,

    /// Name, unless the product or offer is gone
    pub name: Option<String>,

    pub quantity: u32,

    /// Current unit price in kopecks
    pub unit_price: Option<u64>,

    /// Line total in kopecks, zero for unavailable lines
    pub line_total: u64,

    /// `available`, `inactive`, `expired`, `cancelled`, `consumed` or `missing`
    pub availability: String,
}

impl From<PricedLine> for CartItemResponse {
    fn from(line: PricedLine) -> Self {
        Self {
            kind: line.key.kind().as_str().to_string(),
            uuid: line.key.uuid(),
            name: line.name,
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
            availability: line.availability.as_str().to_string(),
        }
    }
}

/// Cart Summary Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartSummaryResponse {
    /// Quantity over available lines
    pub total_quantity: u64,

    /// Price over available lines, in kopecks
    pub total_price: u64,

    /// Number of lines
    pub items_count: usize,

    /// Lines excluded from totals
    pub unavailable_count: usize,

    pub promo_code: Option<PromoCodeInfoResponse>,
}

impl From<CartSummary> for CartSummaryResponse {
    fn from(summary: CartSummary) -> Self {
        Self {
            total_quantity: summary.total_quantity,
            total_price: summary.total_price,
            items_count: summary.items_count,
            unavailable_count: summary.unavailable_count,
            promo_code: summary.promo_code.map(Into::into),
        }
    }
}

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    /// Every line, available or not
    pub items: Vec<CartItemResponse>,

    pub summary: CartSummaryResponse,
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        let summary = view.summary().into();

        Self {
            items: view.cart.lines.into_iter().map(Into::into).collect(),
            summary,
        }
    }
}
