//! Carts service errors.

use spareline::{
    ErrorKind, cart::Availability, errors::ValidationError, pricing::PricingError,
};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind as SqlErrorKind},
};
use thiserror::Error;

use crate::domain::promo_codes::PromoCodesServiceError;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("product or offer not found")]
    ItemNotFound,

    #[error("cart line not found")]
    LineNotFound,

    #[error("item is {}", .0.as_str())]
    Unavailable(Availability),

    #[error("concurrent cart update")]
    Conflict,

    #[error("anonymous cart was moved to a signed-in account")]
    RetiredVisitor,

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

impl CartsServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ItemNotFound | Self::LineNotFound => ErrorKind::NotFound,
            Self::Unavailable(availability) => availability.error_kind(),
            Self::Conflict | Self::RetiredVisitor => ErrorKind::Conflict,
            Self::InvalidData => ErrorKind::InvalidInput,
            Self::Validation(error) => error.kind(),
            Self::PromoCode(error) => error.kind(),
            Self::Pricing(_) | Self::Sql(_) => ErrorKind::Internal,
        }
    }
}

/// `numeric_value_out_of_range`, raised when a summed quantity leaves `INTEGER`.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

impl From<Error> for CartsServiceError {
    fn from(error: Error) -> Self {
        let out_of_range = error
            .as_database_error()
            .and_then(DatabaseError::code)
            .is_some_and(|code| code == NUMERIC_VALUE_OUT_OF_RANGE);

        if out_of_range {
            return Self::InvalidData;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(SqlErrorKind::UniqueViolation) => Self::Conflict,
            Some(SqlErrorKind::CheckViolation | SqlErrorKind::NotNullViolation) => {
                Self::InvalidData
            }
            _ => Self::Sql(error),
        }
    }
}
