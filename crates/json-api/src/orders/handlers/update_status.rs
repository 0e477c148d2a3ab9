//! Update Order Status Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{
        errors::into_status_error, requests::UpdateOrderStatusRequest, responses::OrderResponse,
    },
    state::State,
};

/// Update Order Status Handler
#[endpoint(
    tags("manager"),
    summary = "Update Order Status",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Status changed"),
        (status_code = StatusCode::BAD_REQUEST, description = "Inactive status"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Managers only"),
        (status_code = StatusCode::NOT_FOUND, description = "Order or status not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "manager.orders.status",
    skip(order, json, depot),
    fields(order_uuid = tracing::field::Empty, status_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<UpdateOrderStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_or_401()?.clone();
    let order = order.into_inner();
    let status = json.into_inner().status_uuid;

    let span = tracing::Span::current();

    span.record("order_uuid", tracing::field::display(order));
    span.record("status_uuid", tracing::field::display(status));

    let record = state
        .app
        .orders
        .update_order_status(actor, order.into(), status.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use spareline::identity::Identity;
    use spareline_app::domain::orders::{
        MockOrdersService, OrdersServiceError,
        records::{OrderRecord, OrderStatusRecord},
    };
    use testresult::TestResult;

    use crate::{
        orders::responses::fixtures::order,
        test_helpers::{Mocks, customer, manager, service_as},
    };

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        service_as(
            Mocks {
                orders,
                ..Mocks::default()
            },
            Identity::Authenticated(manager()),
            Router::with_path("manager/orders/{order}/status").put(handler),
        )
    }

    fn url() -> String {
        format!(
            "http://example.com/manager/orders/{}/status",
            Uuid::from_u128(500)
        )
    }

    #[tokio::test]
    async fn changes_the_status() -> TestResult {
        let processing = Uuid::from_u128(601);

        let mut orders = MockOrdersService::new();

        orders
            .expect_update_order_status()
            .once()
            .withf(move |_, order, status| {
                order.into_uuid() == Uuid::from_u128(500) && status.into_uuid() == processing
            })
            .return_once(move |_, _, _| {
                Ok(OrderRecord {
                    status: OrderStatusRecord {
                        uuid: processing.into(),
                        code: "processing".to_string(),
                        name: "Processing".to_string(),
                    },
                    ..order(customer().uuid)
                })
            });

        let mut res = TestClient::put(url())
            .json(&json!({ "status_uuid": processing }))
            .send(&make_service(orders))
            .await;

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.status.code, "processing");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_status_returns_404() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_update_order_status()
            .once()
            .return_once(|_, _, _| Err(OrdersServiceError::StatusNotFound));

        let res = TestClient::put(url())
            .json(&json!({ "status_uuid": Uuid::from_u128(999) }))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
