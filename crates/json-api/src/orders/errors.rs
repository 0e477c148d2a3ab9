//! Errors

use salvo::http::StatusError;

use spareline_app::domain::orders::OrdersServiceError;

use crate::errors::status_error;

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    status_error(error.kind(), &error, "order request failed")
}
