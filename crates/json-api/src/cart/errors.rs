//! Errors

use salvo::http::StatusError;

use spareline_app::domain::carts::CartsServiceError;

use crate::errors::status_error;

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::Conflict => {
            StatusError::conflict().brief("Cart changed concurrently, retry the request")
        }
        other => status_error(other.kind(), &other, "cart request failed"),
    }
}
