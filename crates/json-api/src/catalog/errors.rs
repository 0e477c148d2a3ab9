//! Errors

use salvo::http::StatusError;

use spareline_app::domain::catalog::CatalogServiceError;

use crate::errors::status_error;

pub(crate) fn into_status_error(error: CatalogServiceError) -> StatusError {
    status_error(error.kind(), &error, "catalog request failed")
}
