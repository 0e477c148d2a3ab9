//! Favorite Records

use jiff::Timestamp;
use spareline::uuids::{ProductUuid, TypedUuid};

/// Favorite UUID
pub type FavoriteUuid = TypedUuid<FavoriteRecord>;

/// A product the owner marked as favorite, with its current catalog data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteRecord {
    pub uuid: FavoriteUuid,
    pub product_uuid: ProductUuid,
    pub name: String,
    pub sku: String,
    pub price: u64,
    pub is_active: bool,
    pub in_stock: bool,
    pub created_at: Timestamp,
}
