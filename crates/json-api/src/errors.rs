//! Error kind to HTTP status mapping

use std::error::Error;

use salvo::http::StatusError;
use spareline::ErrorKind;
use tracing::error;

/// Map a service error onto its HTTP status, logging internal failures.
pub(crate) fn status_error<E: Error>(kind: ErrorKind, error: &E, context: &str) -> StatusError {
    let status = match kind {
        ErrorKind::NotFound => StatusError::not_found(),
        ErrorKind::InvalidInput => StatusError::bad_request(),
        ErrorKind::Unavailable | ErrorKind::Conflict => StatusError::conflict(),
        ErrorKind::ValidationFailed => StatusError::unprocessable_entity(),
        ErrorKind::Unauthorized => StatusError::unauthorized(),
        ErrorKind::Forbidden => StatusError::forbidden(),
        ErrorKind::Internal => {
            match error.source() {
                Some(source) => error!("{context}: {error}: {source}"),
                None => error!("{context}: {error}"),
            }

            return StatusError::internal_server_error();
        }
    };

    status.brief(error.to_string())
}
