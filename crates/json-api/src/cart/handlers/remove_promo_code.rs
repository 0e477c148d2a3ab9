//! Remove Promo Code Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{cart::errors::into_status_error, extensions::*, state::State};

/// Remove Promo Code Handler
#[endpoint(
    tags("cart"),
    summary = "Remove Promo Code",
    security(("bearer_auth" = []), ("anonymous_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Promo code removed"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "cart.promo_code.remove", skip_all, err)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_500()?.owner();

    state
        .app
        .carts
        .remove_promo_code(owner)
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::OK)
}
