//! Promo codes service errors.

use spareline::{ErrorKind, errors::ValidationError, pricing::PricingError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind as SqlErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromoCodesServiceError {
    #[error("promo code already exists")]
    AlreadyExists,

    #[error("promo code not found")]
    NotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("only managers may manage promo codes")]
    Forbidden,

    #[error("invalid data")]
    InvalidData,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl PromoCodesServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists => ErrorKind::Conflict,
            Self::NotFound | Self::UserNotFound => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::InvalidData => ErrorKind::InvalidInput,
            Self::Validation(error) => error.kind(),
            Self::Pricing(_) | Self::Sql(_) => ErrorKind::Internal,
        }
    }
}

impl From<Error> for PromoCodesServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(SqlErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(SqlErrorKind::ForeignKeyViolation) => Self::NotFound,
            Some(SqlErrorKind::CheckViolation | SqlErrorKind::NotNullViolation) => {
                Self::InvalidData
            }
            _ => Self::Sql(error),
        }
    }
}
