//! Offer Responses

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline_app::domain::offers::records::OfferRecord;

/// Offer Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OfferResponse {
    pub uuid: Uuid,
    pub product_uuid: Option<Uuid>,

    /// Customer the offer was made for
    pub customer_uuid: Option<Uuid>,

    pub created_by_uuid: Uuid,
    pub name: String,
    pub description: Option<String>,

    /// Price in kopecks
    pub price: u64,

    /// Crossed-out price in kopecks
    pub old_price: Option<u64>,

    pub delivery_days: Option<u32>,
    pub is_original: bool,
    pub is_analog: bool,
    pub is_active: bool,
    pub is_cancelled: bool,
    pub expires_at: Option<String>,
    pub consumed_at: Option<String>,
    pub consumed_by_order_uuid: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<OfferRecord> for OfferResponse {
    fn from(offer: OfferRecord) -> Self {
        Self {
            uuid: offer.uuid.into_uuid(),
            product_uuid: offer.product_uuid.map(|uuid| uuid.into_uuid()),
            customer_uuid: offer.customer_uuid.map(|uuid| uuid.into_uuid()),
            created_by_uuid: offer.created_by_uuid.into_uuid(),
            name: offer.name,
            description: offer.description,
            price: offer.price,
            old_price: offer.old_price,
            delivery_days: offer.delivery_days,
            is_original: offer.is_original,
            is_analog: offer.is_analog,
            is_active: offer.is_active,
            is_cancelled: offer.is_cancelled,
            expires_at: offer.expires_at.map(|at| at.to_string()),
            consumed_at: offer.consumed_at.map(|at| at.to_string()),
            consumed_by_order_uuid: offer.consumed_by_order_uuid.map(|uuid| uuid.into_uuid()),
            created_at: offer.created_at.to_string(),
            updated_at: offer.updated_at.to_string(),
        }
    }
}
