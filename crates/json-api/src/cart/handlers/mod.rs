//! Cart Handlers

pub(crate) mod apply_promo_code;
pub(crate) mod clear;
pub(crate) mod get;
pub(crate) mod remove_promo_code;
pub(crate) mod summary;
