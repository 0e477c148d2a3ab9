//! Promo Codes

pub mod errors;
pub mod records;
pub(crate) mod evaluation;
pub(crate) mod repository;
pub mod service;

pub use errors::PromoCodesServiceError;
pub use service::*;
