//! Checkout Handler

use std::sync::Arc;

use salvo::{http::header::LOCATION, oapi::extract::JsonBody, prelude::*};

use crate::{
    extensions::*,
    orders::{errors::into_status_error, requests::CheckoutRequest, responses::OrderResponse},
    state::State,
};

/// Checkout Handler
///
/// Freezes the signed-in user's cart into an order and empties the cart.
#[endpoint(
    tags("orders"),
    summary = "Checkout",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Empty cart or invalid contact data"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown delivery or payment method"),
        (status_code = StatusCode::CONFLICT, description = "An item cannot be bought"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Promo code no longer applies"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.create",
    skip_all,
    fields(order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CheckoutRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_500()?.clone();

    let order = state
        .app
        .orders
        .create_order(identity, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    tracing::Span::current().record("order_uuid", tracing::field::display(order.uuid));

    res.add_header(LOCATION, format!("/orders/{}", order.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(order.into()))
}
