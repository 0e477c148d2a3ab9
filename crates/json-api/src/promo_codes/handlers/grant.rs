//! Grant Promo Code Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{extensions::*, promo_codes::errors::into_status_error, state::State};

/// Grant Promo Code Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct GrantPromoCodeRequest {
    /// Phone of the registered user receiving the code
    pub phone: String,
}

/// Grant Promo Code Handler
///
/// Lets one user apply a private promo code. Granting twice is harmless.
#[endpoint(
    tags("manager"),
    summary = "Grant Promo Code",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Access granted"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid phone number"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Managers only"),
        (status_code = StatusCode::NOT_FOUND, description = "Promo code or user not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "manager.promo_codes.grant",
    skip(promo_code, json, depot),
    fields(promo_code_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    promo_code: PathParam<Uuid>,
    json: JsonBody<GrantPromoCodeRequest>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_or_401()?.clone();
    let promo_code = promo_code.into_inner();

    tracing::Span::current().record("promo_code_uuid", tracing::field::display(promo_code));

    state
        .app
        .promo_codes
        .grant_promo_code(actor, promo_code.into(), json.into_inner().phone)
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::OK)
}
