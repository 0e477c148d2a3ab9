//! Catalog Records

use jiff::Timestamp;
use spareline::{
    cart::ProductSnapshot,
    errors::ValidationError,
    uuids::{BrandUuid, ProductUuid},
};

/// A catalog product with the fields the storefront prices from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub name: String,
    pub sku: String,

    /// Price in kopecks
    pub price: u64,

    pub is_active: bool,
    pub in_stock: bool,
    pub exclude_from_promo_codes: bool,
    pub brand_uuid: Option<BrandUuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProductRecord {
    /// The pricing view a cart line needs.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            uuid: self.uuid,
            name: self.name.clone(),
            price: self.price,
            is_active: self.is_active,
            in_stock: self.in_stock,
            exclude_from_promo_codes: self.exclude_from_promo_codes,
        }
    }
}

/// Changes to a product's pricing fields. Absent fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingUpdate {
    pub price: Option<u64>,
    pub is_active: Option<bool>,
    pub in_stock: Option<bool>,
    pub exclude_from_promo_codes: Option<bool>,
}

impl PricingUpdate {
    /// Reject an update that changes nothing or zeroes the price.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] or [`ValidationError::NotPositive`].
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self == Self::default() {
            return Err(ValidationError::Empty { field: "pricing" });
        }

        if self.price == Some(0) {
            return Err(ValidationError::NotPositive { field: "price" });
        }

        Ok(self)
    }
}
