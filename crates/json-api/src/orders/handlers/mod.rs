//! Order Handlers

pub(crate) mod create;
pub(crate) mod create_manager;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod update_status;
