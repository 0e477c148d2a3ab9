//! Cart Records

use spareline::{
    cart::{self, CartSummary, PricedCart},
    identity::Owner,
    promo::PromoCodeInfo,
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart item UUID
pub type CartItemUuid = TypedUuid<CartItem>;

/// A stored cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem;

/// A stored cart header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRecord {
    pub uuid: CartUuid,
    pub owner: Owner,

    /// Promo code associated with the cart, re-evaluated on every read
    pub promo_code: Option<String>,
}

/// A cart priced at read time, with its promo code evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartView {
    pub cart: PricedCart,
    pub promo_code: Option<PromoCodeInfo>,
}

impl CartView {
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        cart::summarize(&self.cart, self.promo_code.clone())
    }
}
