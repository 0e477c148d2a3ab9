//! Catalog

pub mod errors;
pub mod records;
pub(crate) mod repositories;
pub mod service;

pub use errors::CatalogServiceError;
pub use service::*;
