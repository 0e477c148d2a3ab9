//! Spareline Domain Concerns

pub mod carts;
pub mod catalog;
pub mod favorites;
pub mod identity;
pub mod offers;
pub mod orders;
pub mod promo_codes;
