//! Create Manager Order Handler

use std::sync::Arc;

use salvo::{http::header::LOCATION, oapi::extract::JsonBody, prelude::*};

use crate::{
    extensions::*,
    orders::{errors::into_status_error, requests::ManagerOrderRequest, responses::OrderResponse},
    state::State,
};

/// Create Manager Order Handler
///
/// Places an order for a customer found or registered by phone, at the prices the
/// manager sets. Inline lines become offers consumed by the order.
#[endpoint(
    tags("manager"),
    summary = "Create Manager Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid order data"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Managers only"),
        (status_code = StatusCode::NOT_FOUND, description = "Unknown product, offer or method"),
        (status_code = StatusCode::CONFLICT, description = "An offer cannot be sold"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "manager.orders.create",
    skip_all,
    fields(order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<ManagerOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_or_401()?.clone();

    let order = state
        .app
        .orders
        .create_manager_order(actor, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    tracing::Span::current().record("order_uuid", tracing::field::display(order.uuid));

    res.add_header(LOCATION, format!("/orders/{}", order.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(order.into()))
}
