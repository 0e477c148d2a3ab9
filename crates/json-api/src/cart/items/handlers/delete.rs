//! Remove Cart Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    cart::{errors::into_status_error, items::handlers::line_key, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Remove Cart Item Handler
///
/// Removing a line that is not in the cart succeeds.
#[endpoint(
    tags("cart"),
    summary = "Remove Cart Item",
    security(("bearer_auth" = []), ("anonymous_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Line removed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid kind"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.items.remove",
    skip(kind, uuid, depot),
    fields(line = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    kind: PathParam<String>,
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_500()?.owner();
    let key = line_key(&kind.into_inner(), uuid.into_inner())?;

    tracing::Span::current().record("line", tracing::field::display(key));

    let view = state
        .app
        .carts
        .remove_item(owner, key)
        .await
        .map_err(into_status_error)?;

    Ok(Json(view.into()))
}
