//! Errors

use salvo::http::StatusError;

use spareline_app::domain::favorites::FavoritesServiceError;

use crate::errors::status_error;

pub(crate) fn into_status_error(error: FavoritesServiceError) -> StatusError {
    status_error(error.kind(), &error, "favorites request failed")
}
