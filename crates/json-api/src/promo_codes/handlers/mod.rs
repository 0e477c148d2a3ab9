//! Promo Code Handlers

pub(crate) mod create;
pub(crate) mod grant;
