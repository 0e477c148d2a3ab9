//! Orders

mod errors;
pub(crate) mod handlers;
pub(crate) mod requests;
pub(crate) mod responses;

pub(crate) use handlers::*;
