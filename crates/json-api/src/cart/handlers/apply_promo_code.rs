//! Apply Promo Code Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    cart::{errors::into_status_error, responses::PromoCodeInfoResponse},
    extensions::*,
    state::State,
};

/// Apply Promo Code Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ApplyPromoCodeRequest {
    /// Code as typed; case and surrounding spaces are ignored
    pub code: String,
}

/// Apply Promo Code Handler
///
/// The evaluation is returned either way. The code is kept on the cart only when it
/// gives a discount.
#[endpoint(
    tags("cart"),
    summary = "Apply Promo Code",
    security(("bearer_auth" = []), ("anonymous_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Promo code evaluated"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "cart.promo_code.apply", skip_all, err)]
pub(crate) async fn handler(
    json: JsonBody<ApplyPromoCodeRequest>,
    depot: &mut Depot,
) -> Result<Json<PromoCodeInfoResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_500()?.owner();

    let info = state
        .app
        .carts
        .apply_promo_code(owner, json.into_inner().code)
        .await
        .map_err(into_status_error)?;

    Ok(Json(info.into()))
}
