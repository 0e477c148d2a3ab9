//! Cart Summary Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    cart::{errors::into_status_error, responses::CartSummaryResponse},
    extensions::*,
    state::State,
};

/// Cart Summary Handler
///
/// Totals and the promo code evaluation without the lines.
#[endpoint(
    tags("cart"),
    summary = "Get Cart Summary",
    security(("bearer_auth" = []), ("anonymous_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart summary"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "cart.summary", skip_all, err)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartSummaryResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_500()?.owner();

    let summary = state
        .app
        .carts
        .get_summary(owner)
        .await
        .map_err(into_status_error)?;

    Ok(Json(summary.into()))
}
