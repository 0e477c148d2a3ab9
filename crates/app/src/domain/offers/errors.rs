//! Offers service errors.

use spareline::{ErrorKind, errors::ValidationError, offers::OfferChangeError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind as SqlErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OffersServiceError {
    #[error("offer not found")]
    NotFound,

    #[error("only managers may manage offers")]
    Forbidden,

    #[error(transparent)]
    Change(#[from] OfferChangeError),

    #[error("referenced product or customer does not exist")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl OffersServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound | Self::InvalidReference => ErrorKind::NotFound,
            Self::Forbidden | Self::Change(OfferChangeError::NotOwner) => ErrorKind::Forbidden,
            Self::Change(OfferChangeError::Closed(availability)) => availability.error_kind(),
            Self::InvalidData => ErrorKind::InvalidInput,
            Self::Validation(error) => error.kind(),
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}

impl From<Error> for OffersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(SqlErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(SqlErrorKind::CheckViolation | SqlErrorKind::NotNullViolation) => {
                Self::InvalidData
            }
            _ => Self::Sql(error),
        }
    }
}
