//! Promo Code Records

use spareline::{
    promo::{PromoCode, PromoCodeInfo},
    uuids::TypedUuid,
};

/// Promo code usage UUID
pub type PromoCodeUsageUuid = TypedUuid<PromoCodeUsage>;

/// A recorded use of a promo code by an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromoCodeUsage;

/// A promo code evaluated against a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedPromo {
    pub info: PromoCodeInfo,

    /// The stored code, when one exists
    pub promo: Option<PromoCode>,
}

impl EvaluatedPromo {
    /// The stored code when it grants its discount.
    #[must_use]
    pub fn applied(&self) -> Option<&PromoCode> {
        self.promo.as_ref().filter(|_| self.info.is_valid())
    }
}
