//! Errors

use salvo::http::StatusError;

use spareline_app::domain::identity::IdentityServiceError;

use crate::errors::status_error;

pub(crate) fn into_status_error(error: IdentityServiceError) -> StatusError {
    match error {
        IdentityServiceError::InvalidCode | IdentityServiceError::TooManyAttempts => {
            StatusError::unauthorized().brief(error.to_string())
        }
        other => status_error(other.kind(), &other, "identity request failed"),
    }
}
