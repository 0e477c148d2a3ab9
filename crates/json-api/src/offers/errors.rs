//! Errors

use salvo::http::StatusError;

use spareline_app::domain::offers::OffersServiceError;

use crate::errors::status_error;

pub(crate) fn into_status_error(error: OffersServiceError) -> StatusError {
    status_error(error.kind(), &error, "offer request failed")
}
