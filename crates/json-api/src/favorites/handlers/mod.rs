//! Favorites Handlers

pub(crate) mod add;
pub(crate) mod index;
pub(crate) mod remove;
