//! Offer Records

use jiff::Timestamp;
use spareline::{
    cart::OfferSnapshot,
    offers::{NewOffer, OfferState},
    uuids::{OfferUuid, ProductUuid, UserUuid},
};

use crate::domain::orders::records::OrderUuid;

/// A stored product offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferRecord {
    pub uuid: OfferUuid,
    pub product_uuid: Option<ProductUuid>,
    pub customer_uuid: Option<UserUuid>,

    /// Manager who created the offer
    pub created_by_uuid: UserUuid,

    pub name: String,
    pub description: Option<String>,
    pub price: u64,
    pub old_price: Option<u64>,
    pub delivery_days: Option<u32>,
    pub is_original: bool,
    pub is_analog: bool,
    pub is_active: bool,
    pub is_cancelled: bool,
    pub expires_at: Option<Timestamp>,
    pub consumed_at: Option<Timestamp>,
    pub consumed_by_order_uuid: Option<OrderUuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OfferRecord {
    #[must_use]
    pub const fn state(&self) -> OfferState {
        OfferState {
            is_active: self.is_active,
            is_cancelled: self.is_cancelled,
            expires_at: self.expires_at,
            consumed_at: self.consumed_at,
        }
    }

    /// The pricing view a cart line needs.
    #[must_use]
    pub fn snapshot(&self) -> OfferSnapshot {
        OfferSnapshot {
            uuid: self.uuid,
            name: self.name.clone(),
            price: self.price,
            state: self.state(),
        }
    }

    /// The editable fields, as a base for an update.
    #[must_use]
    pub fn editable(&self) -> NewOffer {
        NewOffer {
            product: self.product_uuid,
            customer: self.customer_uuid,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            old_price: self.old_price,
            delivery_days: self.delivery_days,
            is_original: self.is_original,
            is_analog: self.is_analog,
            expires_at: self.expires_at,
        }
    }
}
