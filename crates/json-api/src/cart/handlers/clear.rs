//! Clear Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{cart::errors::into_status_error, extensions::*, state::State};

/// Clear Cart Handler
///
/// Removes every line. The promo code stays attached.
#[endpoint(
    tags("cart"),
    summary = "Clear Cart",
    security(("bearer_auth" = []), ("anonymous_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart cleared"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "cart.clear", skip_all, err)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_500()?.owner();

    state
        .app
        .carts
        .clear(owner)
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use spareline_app::domain::carts::MockCartsService;
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, anonymous, service_as};

    use super::*;

    #[tokio::test]
    async fn clears_the_owners_cart() -> TestResult {
        let mut carts = MockCartsService::new();

        carts.expect_clear().once().return_once(|_| Ok(()));

        let service = service_as(
            Mocks {
                carts,
                ..Mocks::default()
            },
            anonymous(),
            Router::with_path("cart").delete(handler),
        );

        let res = TestClient::delete("http://example.com/cart")
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }
}
