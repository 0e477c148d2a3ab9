//! Deactivate Offer Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    offers::{errors::into_status_error, responses::OfferResponse},
    state::State,
};

/// Deactivate Offer Handler
///
/// Takes the offer off sale. Carts keep the line and report it inactive.
#[endpoint(
    tags("manager"),
    summary = "Deactivate Offer",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Offer deactivated"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Not your offer"),
        (status_code = StatusCode::NOT_FOUND, description = "Offer not found"),
        (status_code = StatusCode::CONFLICT, description = "Offer is closed"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "manager.offers.deactivate",
    skip(offer, depot),
    fields(offer_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    offer: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OfferResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_or_401()?.clone();
    let offer = offer.into_inner();

    tracing::Span::current().record("offer_uuid", tracing::field::display(offer));

    let record = state
        .app
        .offers
        .deactivate_offer(actor, offer.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use spareline::identity::Identity;
    use spareline_app::domain::offers::{MockOffersService, records::OfferRecord};
    use testresult::TestResult;

    use crate::{
        offers::responses::fixtures::offer,
        test_helpers::{Mocks, anonymous, manager, service_as},
    };

    use super::*;

    fn make_service(offers: MockOffersService, identity: Identity) -> Service {
        service_as(
            Mocks {
                offers,
                ..Mocks::default()
            },
            identity,
            Router::with_path("manager/offers/{offer}/deactivate").post(handler),
        )
    }

    fn url() -> String {
        format!(
            "http://example.com/manager/offers/{}/deactivate",
            Uuid::from_u128(21)
        )
    }

    #[tokio::test]
    async fn deactivates_the_offer() -> TestResult {
        let mut offers = MockOffersService::new();

        offers
            .expect_deactivate_offer()
            .once()
            .withf(|_, uuid| uuid.into_uuid() == Uuid::from_u128(21))
            .return_once(|actor, _| {
                Ok(OfferRecord {
                    is_active: false,
                    ..offer(actor.uuid)
                })
            });

        let mut res = TestClient::post(url())
            .send(&make_service(offers, Identity::Authenticated(manager())))
            .await;

        let body: OfferResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(!body.is_active, "offer inactive");
        assert!(!body.is_cancelled, "deactivation is not cancellation");

        Ok(())
    }

    #[tokio::test]
    async fn anonymous_visitors_get_401() -> TestResult {
        let res = TestClient::post(url())
            .send(&make_service(MockOffersService::new(), anonymous()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
