//! Add Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline::{
    cart::AddItem,
    uuids::{OfferUuid, ProductUuid},
};

use crate::{
    cart::{errors::into_status_error, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Add Cart Item Request
///
/// Exactly one of `product_uuid` and `offer_uuid` must be set.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddCartItemRequest {
    pub product_uuid: Option<Uuid>,
    pub offer_uuid: Option<Uuid>,

    /// Added to an existing line for the same product or offer
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

impl From<AddCartItemRequest> for AddItem {
    fn from(request: AddCartItemRequest) -> Self {
        Self {
            product: request.product_uuid.map(ProductUuid::from),
            offer: request.offer_uuid.map(OfferUuid::from),
            quantity: request.quantity,
        }
    }
}

/// Add Cart Item Handler
#[endpoint(
    tags("cart"),
    summary = "Add Cart Item",
    security(("bearer_auth" = []), ("anonymous_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Item added"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid item reference or quantity"),
        (status_code = StatusCode::NOT_FOUND, description = "Product or offer not found"),
        (status_code = StatusCode::CONFLICT, description = "Item cannot be bought"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "cart.items.add", skip_all, err)]
pub(crate) async fn handler(
    json: JsonBody<AddCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_500()?.owner();

    let view = state
        .app
        .carts
        .add_item(owner, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(view.into()))
}
