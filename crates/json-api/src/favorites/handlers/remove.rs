//! Remove Favorite Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{extensions::*, favorites::errors::into_status_error, state::State};

/// Remove Favorite Handler
#[endpoint(
    tags("favorites"),
    summary = "Remove Favorite",
    security(("bearer_auth" = []), ("anonymous_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Removed, or was not a favorite"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "favorites.remove",
    skip(product, depot),
    fields(product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_500()?.owner();
    let product = product.into_inner();

    tracing::Span::current().record("product_uuid", tracing::field::display(product));

    state
        .app
        .favorites
        .remove(owner, product.into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::OK)
}
