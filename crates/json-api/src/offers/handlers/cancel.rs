//! Cancel Offer Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    offers::{errors::into_status_error, responses::OfferResponse},
    state::State,
};

/// Cancel Offer Handler
///
/// Withdraws the offer for good.
#[endpoint(
    tags("manager"),
    summary = "Cancel Offer",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Offer cancelled"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Not your offer"),
        (status_code = StatusCode::NOT_FOUND, description = "Offer not found"),
        (status_code = StatusCode::CONFLICT, description = "Offer is closed"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "manager.offers.cancel",
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
        .cancel_offer(actor, offer.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
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
            Router::with_path("manager/offers/{offer}/cancel").post(handler),
        )
    }

    fn url() -> String {
        format!(
            "http://example.com/manager/offers/{}/cancel",
            Uuid::from_u128(21)
        )
    }

    #[tokio::test]
    async fn cancels_the_offer() -> TestResult {
        let mut offers = MockOffersService::new();

        offers.expect_cancel_offer().once().return_once(|actor, _| {
            Ok(OfferRecord {
                is_cancelled: true,
                ..offer(actor.uuid)
            })
        });

        let mut res = TestClient::post(url()).send(&make_service(offers)).await;

        let body: OfferResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.is_cancelled, "offer cancelled");

        Ok(())
    }

    #[tokio::test]
    async fn consumed_offers_return_409() -> TestResult {
        let mut offers = MockOffersService::new();

        offers.expect_cancel_offer().once().return_once(|_, _| {
            Err(OffersServiceError::Change(OfferChangeError::Closed(
                Availability::Consumed,
            )))
        });

        let res = TestClient::post(url()).send(&make_service(offers)).await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
