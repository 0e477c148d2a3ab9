//! Get Offer Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    offers::{errors::into_status_error, responses::OfferResponse},
    state::State,
};

/// Get Offer Handler
#[endpoint(
    tags("manager"),
    summary = "Get Offer",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Offer"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Staff only"),
        (status_code = StatusCode::NOT_FOUND, description = "Offer not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "manager.offers.get",
    skip(offer, depot),
    fields(offer_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    offer: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OfferResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    depot.staff_or_403()?;

    let offer = offer.into_inner();

    tracing::Span::current().record("offer_uuid", tracing::field::display(offer));

    let record = state
        .app
        .offers
        .get_offer(offer.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(record.into()))
}
