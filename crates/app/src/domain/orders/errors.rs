//! Orders service errors.

use spareline::{
    ErrorKind, errors::ValidationError, orders::OrderAssemblyError, pricing::PricingError,
};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind as SqlErrorKind},
};
use thiserror::Error;

use crate::domain::promo_codes::PromoCodesServiceError;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("sign in to place an order")]
    Unauthorized,

    #[error("only managers may do this")]
    Forbidden,

    #[error("order not found")]
    NotFound,

    #[error("order status not found")]
    StatusNotFound,

    #[error("order status is inactive")]
    InactiveStatus,

    #[error("no initial order status is configured")]
    NoInitialStatus,

    #[error(transparent)]
    Assembly(#[from] OrderAssemblyError),

    #[error("concurrent order update")]
    Conflict,

    #[error("referenced row does not exist")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    PromoCode(#[from] PromoCodesServiceError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl OrdersServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::NotFound | Self::StatusNotFound | Self::InvalidReference => ErrorKind::NotFound,
            Self::InactiveStatus | Self::InvalidData => ErrorKind::InvalidInput,
            Self::Assembly(error) => error.kind(),
            Self::Conflict => ErrorKind::Conflict,
            Self::Validation(error) => error.kind(),
            Self::PromoCode(error) => error.kind(),
            Self::NoInitialStatus | Self::Pricing(_) | Self::Sql(_) => ErrorKind::Internal,
        }
    }
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(SqlErrorKind::UniqueViolation) => Self::Conflict,
            Some(SqlErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(SqlErrorKind::CheckViolation | SqlErrorKind::NotNullViolation) => {
                Self::InvalidData
            }
            _ => Self::Sql(error),
        }
    }
}
