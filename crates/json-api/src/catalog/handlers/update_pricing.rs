//! Update Product Pricing Handler

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

use spareline_app::domain::catalog::records::PricingUpdate;

use crate::{
    catalog::{errors::into_status_error, responses::ProductResponse},
    extensions::*,
    state::State,
};

/// Update Pricing Request
///
/// Absent fields keep their value.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdatePricingRequest {
    /// Price in kopecks
    pub price: Option<u64>,

    pub is_active: Option<bool>,
    pub in_stock: Option<bool>,
    pub exclude_from_promo_codes: Option<bool>,
}

impl From<UpdatePricingRequest> for PricingUpdate {
    fn from(request: UpdatePricingRequest) -> Self {
        Self {
            price: request.price,
            is_active: request.is_active,
            in_stock: request.in_stock,
            exclude_from_promo_codes: request.exclude_from_promo_codes,
        }
    }
}

/// Update Product Pricing Handler
///
/// Carts pick up the new price on their next read; placed orders keep theirs.
#[endpoint(
    tags("manager"),
    summary = "Update Product Pricing",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Product updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Empty update or zero price"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Managers only"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "manager.products.pricing",
    skip(product, json, depot),
    fields(product_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    json: JsonBody<UpdatePricingRequest>,
    depot: &mut Depot,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_or_401()?.clone();
    let product = product.into_inner();

    tracing::Span::current().record("product_uuid", tracing::field::display(product));

    let record = state
        .app
        .catalog
        .update_pricing(actor, product.into(), json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use spareline::{identity::Identity, uuids::ProductUuid};
    use spareline_app::domain::catalog::{
        CatalogServiceError, MockCatalogService, records::ProductRecord,
    };
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, anonymous, customer, manager, service_as};

    use super::*;

    const ROUTE: &str = "manager/products/{product}/pricing";

    fn make_service(catalog: MockCatalogService, identity: Identity) -> Service {
        service_as(
            Mocks {
                catalog,
                ..Mocks::default()
            },
            identity,
            Router::with_path(ROUTE).put(handler),
        )
    }

    fn url() -> String {
        format!(
            "http://example.com/manager/products/{}/pricing",
            Uuid::from_u128(11)
        )
    }

    #[tokio::test]
    async fn manager_updates_the_price() -> TestResult {
        let product = ProductUuid::from_uuid(Uuid::from_u128(11));

        let mut catalog = MockCatalogService::new();

        catalog
            .expect_update_pricing()
            .once()
            .withf(move |actor, uuid, update| {
                actor.uuid == manager().uuid
                    && *uuid == product
                    && update.price == Some(99_000)
                    && update.is_active.is_none()
            })
            .return_once(move |_, _, _| {
                Ok(ProductRecord {
                    uuid: product,
                    name: "Brake disc".to_string(),
                    sku: "BD-1".to_string(),
                    price: 99_000,
                    is_active: true,
                    in_stock: true,
                    exclude_from_promo_codes: false,
                    brand_uuid: None,
                    created_at: Timestamp::UNIX_EPOCH,
                    updated_at: Timestamp::UNIX_EPOCH,
                })
            });

        let mut res = TestClient::put(url())
            .json(&json!({ "price": 99_000 }))
            .send(&make_service(catalog, Identity::Authenticated(manager())))
            .await;

        let body: ProductResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.price, 99_000);

        Ok(())
    }

    #[tokio::test]
    async fn anonymous_visitors_get_401() -> TestResult {
        let res = TestClient::put(url())
            .json(&json!({ "price": 99_000 }))
            .send(&make_service(MockCatalogService::new(), anonymous()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn customers_get_403() -> TestResult {
        let mut catalog = MockCatalogService::new();

        catalog
            .expect_update_pricing()
            .once()
            .return_once(|_, _, _| Err(CatalogServiceError::Forbidden));

        let res = TestClient::put(url())
            .json(&json!({ "in_stock": false }))
            .send(&make_service(catalog, Identity::Authenticated(customer())))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
