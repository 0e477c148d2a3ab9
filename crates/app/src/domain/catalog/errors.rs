//! Catalog service errors.

use spareline::{ErrorKind, errors::ValidationError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind as SqlErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("product not found")]
    NotFound,

    #[error("only managers may change product pricing")]
    Forbidden,

    #[error("invalid data")]
    InvalidData,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl CatalogServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::InvalidData => ErrorKind::InvalidInput,
            Self::Validation(error) => error.kind(),
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}

impl From<Error> for CatalogServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(SqlErrorKind::CheckViolation | SqlErrorKind::NotNullViolation) => {
                Self::InvalidData
            }
            _ => Self::Sql(error),
        }
    }
}
