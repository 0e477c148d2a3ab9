//! Favorites service errors.

use spareline::ErrorKind;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind as SqlErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FavoritesServiceError {
    #[error("product not found")]
    ProductNotFound,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl FavoritesServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProductNotFound => ErrorKind::NotFound,
            Self::Sql(_) => ErrorKind::Internal,
        }
    }
}

impl From<Error> for FavoritesServiceError {
    fn from(error: Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(SqlErrorKind::ForeignKeyViolation) => Self::ProductNotFound,
            _ => Self::Sql(error),
        }
    }
}
