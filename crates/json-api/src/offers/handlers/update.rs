//! Update Offer Handler

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

use spareline::offers::OfferUpdate;

use crate::{
    extensions::*,
    offers::{errors::into_status_error, responses::OfferResponse},
    state::State,
};

/// Update Offer Request
///
/// Absent fields keep their value.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateOfferRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub old_price: Option<u64>,
    pub delivery_days: Option<u32>,
    pub is_original: Option<bool>,
    pub is_analog: Option<bool>,
    pub expires_at: Option<String>,
}

impl UpdateOfferRequest {
    fn into_update(self) -> Result<OfferUpdate, StatusError> {
        Ok(OfferUpdate {
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

/// Update Offer Handler
///
/// Managers may change only their own offers; admins any. Cancelled and consumed
/// offers are final.
#[endpoint(
    tags("manager"),
    summary = "Update Offer",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Offer updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid offer data"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Not your offer"),
        (status_code = StatusCode::NOT_FOUND, description = "Offer not found"),
        (status_code = StatusCode::CONFLICT, description = "Offer is closed"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "manager.offers.update",
    skip(offer, json, depot),
    fields(offer_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    offer: PathParam<Uuid>,
    json: JsonBody<UpdateOfferRequest>,
    depot: &mut Depot,
) -> Result<Json<OfferResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_or_401()?.clone();
    let offer = offer.into_inner();
    let update = json.into_inner().into_update()?;

    tracing::Span::current().record("offer_uuid", tracing::field::display(offer));

    let record = state
        .app
        .offers
        .update_offer(actor, offer.into(), update)
        .await
        .map_err(into_status_error)?;

    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use spareline::{cart::Availability, identity::Identity, offers::OfferChangeError};
    use spareline_app::domain::offers::{
        MockOffersService, OffersServiceError, records::OfferRecord,
    };
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
            Router::with_path("manager/offers/{offer}").put(handler),
        )
    }

    fn url() -> String {
        format!("http://example.com/manager/offers/{}", Uuid::from_u128(21))
    }

    #[tokio::test]
    async fn updates_only_given_fields() -> TestResult {
        let mut offers = MockOffersService::new();

        offers
            .expect_update_offer()
            .once()
            .withf(|_, uuid, update| {
                uuid.into_uuid() == Uuid::from_u128(21)
                    && update.price == Some(600_000)
                    && update.name.is_none()
            })
            .return_once(|actor, _, _| {
                Ok(OfferRecord {
                    price: 600_000,
                    ..offer(actor.uuid)
                })
            });

        let mut res = TestClient::put(url())
            .json(&json!({ "price": 600_000 }))
            .send(&make_service(offers))
            .await;

        let body: OfferResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.price, 600_000);

        Ok(())
    }

    #[tokio::test]
    async fn maps_change_refusals() -> TestResult {
        let cases = [
            (
                OffersServiceError::Change(OfferChangeError::NotOwner),
                StatusCode::FORBIDDEN,
            ),
            (
                OffersServiceError::Change(OfferChangeError::Closed(Availability::Consumed)),
                StatusCode::CONFLICT,
            ),
            (OffersServiceError::NotFound, StatusCode::NOT_FOUND),
        ];

        for (error, status) in cases {
            let mut offers = MockOffersService::new();

            offers
                .expect_update_offer()
                .once()
                .return_once(|_, _, _| Err(error));

            let res = TestClient::put(url())
                .json(&json!({ "name": "Belt" }))
                .send(&make_service(offers))
                .await;

            assert_eq!(res.status_code, Some(status));
        }

        Ok(())
    }
}
