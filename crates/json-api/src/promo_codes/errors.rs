//! Errors

use salvo::http::StatusError;

use spareline_app::domain::promo_codes::PromoCodesServiceError;

use crate::errors::status_error;

pub(crate) fn into_status_error(error: PromoCodesServiceError) -> StatusError {
    status_error(error.kind(), &error, "promo code request failed")
}
