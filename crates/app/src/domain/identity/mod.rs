//! Identity

pub mod errors;
pub mod otp;
pub mod records;
pub(crate) mod repositories;
pub mod service;
pub mod tokens;

pub use errors::IdentityServiceError;
pub use service::*;
