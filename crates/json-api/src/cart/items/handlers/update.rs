//! Update Cart Item Handler

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

use crate::{
    cart::{errors::into_status_error, items::handlers::line_key, responses::CartResponse},
    extensions::*,
    state::State,
};

/// Update Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateCartItemRequest {
    /// New quantity, at least one
    pub quantity: u32,
}

/// Update Cart Item Handler
#[endpoint(
    tags("cart"),
    summary = "Update Cart Item",
    security(("bearer_auth" = []), ("anonymous_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Quantity updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid kind or quantity"),
        (status_code = StatusCode::NOT_FOUND, description = "Line not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.items.update",
    skip(kind, uuid, json, depot),
    fields(line = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    kind: PathParam<String>,
    uuid: PathParam<Uuid>,
    json: JsonBody<UpdateCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_500()?.owner();
    let key = line_key(&kind.into_inner(), uuid.into_inner())?;

    tracing::Span::current().record("line", tracing::field::display(key));

    let view = state
        .app
        .carts
        .update_item(owner, key, json.into_inner().quantity)
        .await
        .map_err(into_status_error)?;

    Ok(Json(view.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use serde_json::json;
    use spareline::{cart::CartLineKey, errors::ValidationError, uuids::OfferUuid};
    use spareline_app::domain::carts::{CartsServiceError, MockCartsService, records::CartView};
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, anonymous, service_as};

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        service_as(
            Mocks {
                carts,
                ..Mocks::default()
            },
            anonymous(),
            Router::with_path("cart/items/{kind}/{uuid}").put(handler),
        )
    }

    #[tokio::test]
    async fn updates_an_offer_line() -> TestResult {
        let offer = OfferUuid::from_uuid(Uuid::from_u128(21));

        let mut carts = MockCartsService::new();

        carts
            .expect_update_item()
            .once()
            .withf(move |_, key, quantity| *key == CartLineKey::Offer(offer) && *quantity == 3)
            .return_once(|_, _, _| Ok(CartView::default()));

        let res = TestClient::put(format!(
            "http://example.com/cart/items/offer/{}",
            offer.into_uuid()
        ))
        .json(&json!({ "quantity": 3 }))
        .send(&make_service(carts))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_kind_returns_400() -> TestResult {
        let res = TestClient::put(format!(
            "http://example.com/cart/items/bundle/{}",
            Uuid::from_u128(21)
        ))
        .json(&json!({ "quantity": 3 }))
        .send(&make_service(MockCartsService::new()))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_returns_400() -> TestResult {
        let mut carts = MockCartsService::new();

        carts
            .expect_update_item()
            .once()
            .return_once(|_, _, _| Err(CartsServiceError::Validation(ValidationError::Quantity)));

        let res = TestClient::put(format!(
            "http://example.com/cart/items/product/{}",
            Uuid::from_u128(11)
        ))
        .json(&json!({ "quantity": 0 }))
        .send(&make_service(carts))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
