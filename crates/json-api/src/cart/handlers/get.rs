//! Get Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    cart::{errors::into_status_error, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Get Cart Handler
///
/// Every line is priced at read time. Unavailable lines are listed but left out of
/// the totals.
#[endpoint(
    tags("cart"),
    summary = "Get Cart",
    security(("bearer_auth" = []), ("anonymous_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "cart.get", skip_all, err)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_500()?.owner();

    let view = state
        .app
        .carts
        .get_cart(owner)
        .await
        .map_err(into_status_error)?;

    Ok(Json(view.into()))
}
