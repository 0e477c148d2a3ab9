//! Catalog Handlers

pub(crate) mod filters;
pub(crate) mod update_pricing;
