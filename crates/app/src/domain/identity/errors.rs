//! Identity service errors.

use spareline::{ErrorKind, errors::ValidationError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind as SqlErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityServiceError {
    #[error("user not found")]
    NotFound,

    #[error("login code is invalid or expired")]
    InvalidCode,

    #[error("too many attempts for this login code")]
    TooManyAttempts,

    #[error("user already exists")]
    AlreadyExists,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("token lifetime is out of range")]
    Lifetime(#[source] jiff::Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl IdentityServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::InvalidCode | Self::TooManyAttempts => ErrorKind::Unauthorized,
            Self::AlreadyExists => ErrorKind::Conflict,
            Self::Validation(error) => error.kind(),
            Self::Lifetime(_) | Self::Sql(_) => ErrorKind::Internal,
        }
    }
}

impl From<Error> for IdentityServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(SqlErrorKind::UniqueViolation) => Self::AlreadyExists,
            _ => Self::Sql(error),
        }
    }
}
