//! Create Offer Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline::{
    offers::NewOffer,
    uuids::{ProductUuid, UserUuid},
};

use crate::{
    extensions::*,
    offers::{errors::into_status_error, responses::OfferResponse},
    state::State,
};

/// Create Offer Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOfferRequest {
    /// Related catalog product
    pub product_uuid: Option<Uuid>,

    /// Customer the offer is made for
    pub customer_uuid: Option<Uuid>,

    pub name: String,
    pub description: Option<String>,

    /// Price in kopecks
    pub price: u64,

    /// Crossed-out price in kopecks
    pub old_price: Option<u64>,

    pub delivery_days: Option<u32>,

    #[serde(default)]
    pub is_original: bool,

    #[serde(default)]
    pub is_analog: bool,

    /// RFC 3339 timestamp, in the future
    pub expires_at: Option<String>,
}

impl CreateOfferRequest {
    fn into_new_offer(self) -> Result<NewOffer, StatusError> {
        Ok(NewOffer {
            product: self.product_uuid.map(ProductUuid::from),
            customer: self.customer_uuid.map(UserUuid::from),
            name: self.name,
            description: self.description,
            price: self.price,
            old_price: self.old_price,
            delivery_days: self.delivery_days,
            is_original: self.is_original,
            is_analog: self.is_analog,
            expires_at: self.expires_at.into_timestamp("expires_at")?,
        })
    }
}

/// Create Offer Handler
#[endpoint(
    tags("manager"),
    summary = "Create Offer",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Offer created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid offer data"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Managers only"),
        (status_code = StatusCode::NOT_FOUND, description = "Product or customer not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "manager.offers.create",
    skip_all,
    fields(offer_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateOfferRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OfferResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_or_401()?.clone();
    let offer = json.into_inner().into_new_offer()?;

    let record = state
        .app
        .offers
        .create_offer(actor, offer)
        .await
        .map_err(into_status_error)?;

    tracing::Span::current().record("offer_uuid", tracing::field::display(record.uuid));

    res.add_header(LOCATION, format!("/manager/offers/{}", record.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use spareline::{errors::ValidationError, identity::Identity};
    use spareline_app::domain::offers::{MockOffersService, OffersServiceError};
    use testresult::TestResult;

    use crate::{
        offers::responses::fixtures::offer,
        test_helpers::{Mocks, manager, service_as},
    };

    use super::*;

    fn make_service(offers: MockOffersService) -> Service {
        service_as(
            Mocks {
                offers,
                ..Mocks::default()
            },
            Identity::Authenticated(manager()),
            Router::with_path("manager/offers").post(handler),
        )
    }

    #[tokio::test]
    async fn creates_an_offer() -> TestResult {
        let mut offers = MockOffersService::new();

        offers
            .expect_create_offer()
            .once()
            .withf(|_, offer| {
                offer.name == "Timing belt kit"
                    && offer.price == 650_000
                    && offer.is_original
                    && offer.expires_at.is_some()
            })
            .return_once(|actor, _| Ok(offer(actor.uuid)));

        let mut res = TestClient::post("http://example.com/manager/offers")
            .json(&json!({
                "name": "Timing belt kit",
                "price": 650_000,
                "old_price": 720_000,
                "is_original": true,
                "expires_at": "2030-01-01T00:00:00Z",
            }))
            .send(&make_service(offers))
            .await;

        let body: OfferResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.created_by_uuid, manager().uuid.into_uuid());
        assert_eq!(body.old_price, Some(720_000));

        Ok(())
    }

    #[tokio::test]
    async fn unparseable_expiry_returns_400() -> TestResult {
        let res = TestClient::post("http://example.com/manager/offers")
            .json(&json!({ "name": "Belt", "price": 1, "expires_at": "soon" }))
            .send(&make_service(MockOffersService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn original_and_analog_returns_400() -> TestResult {
        let mut offers = MockOffersService::new();

        offers.expect_create_offer().once().return_once(|_, _| {
            Err(OffersServiceError::Validation(
                ValidationError::OriginalAndAnalog,
            ))
        });

        let res = TestClient::post("http://example.com/manager/offers")
            .json(&json!({
                "name": "Belt",
                "price": 1,
                "is_original": true,
                "is_analog": true,
            }))
            .send(&make_service(offers))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
