//! Spareline
//!
//! Spareline is the pricing core of an auto-parts storefront: visitor identity, cart
//! pricing, promo codes, order assembly and catalog facets, as plain functions over
//! plain data. Persistence lives in `spareline-app`.

pub mod cart;
pub mod errors;
pub mod facets;
pub mod identity;
pub mod offers;
pub mod orders;
pub mod phone;
pub mod pricing;
pub mod promo;
pub mod uuids;

pub use errors::ErrorKind;
