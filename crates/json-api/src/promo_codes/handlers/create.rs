//! Create Promo Code Handler

use std::{str::FromStr, sync::Arc};

use jiff::Timestamp;
use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline::promo::{DiscountType, NewPromoCode, PromoCode, PromoDiscount};

use crate::{extensions::*, promo_codes::errors::into_status_error, state::State};

/// Create Promo Code Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreatePromoCodeRequest {
    /// Letters, digits, `-` and `_`; stored upper-case
    pub code: String,

    /// `FIXED_AMOUNT` or `PERCENTAGE`
    pub discount_type: String,

    /// Kopecks for fixed amounts, percent for percentages, as a decimal string
    pub discount_value: String,

    /// Minimum eligible cart amount in kopecks
    pub min_order_amount: Option<u64>,

    /// RFC 3339 timestamp; defaults to now
    pub valid_from: Option<String>,

    /// RFC 3339 timestamp
    pub valid_until: Option<String>,

    #[serde(default = "yes")]
    pub is_public: bool,

    #[serde(default)]
    pub first_order_only: bool,

    pub max_uses_total: Option<u64>,

    #[serde(default = "one")]
    pub max_uses_per_user: u64,
}

const fn yes() -> bool {
    true
}

const fn one() -> u64 {
    1
}

impl CreatePromoCodeRequest {
    fn into_new_promo_code(self) -> Result<NewPromoCode, StatusError> {
        let discount_type = DiscountType::from_str(&self.discount_type)
            .or_400("discount_type must be FIXED_AMOUNT or PERCENTAGE")?;

        let discount = match discount_type {
            DiscountType::FixedAmount => PromoDiscount::FixedAmount(
                self.discount_value
                    .trim()
                    .parse::<u64>()
                    .or_400("discount_value must be a whole number of kopecks")?,
            ),
            DiscountType::Percentage => PromoDiscount::Percentage(
                Decimal::from_str(self.discount_value.trim())
                    .or_400("discount_value must be a number")?,
            ),
        };

        Ok(NewPromoCode {
            code: self.code,
            discount,
            min_order_amount: self.min_order_amount,
            valid_from: self
                .valid_from
                .into_timestamp("valid_from")?
                .unwrap_or_else(Timestamp::now),
            valid_until: self.valid_until.into_timestamp("valid_until")?,
            is_public: self.is_public,
            first_order_only: self.first_order_only,
            max_uses_total: self.max_uses_total,
            max_uses_per_user: self.max_uses_per_user,
        })
    }
}

/// Promo Code Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PromoCodeResponse {
    pub uuid: Uuid,
    pub code: String,
    pub discount_type: String,
    pub discount_value: String,
    pub min_order_amount: Option<u64>,
    pub valid_from: String,
    pub valid_until: Option<String>,
    pub is_active: bool,
    pub is_public: bool,
    pub first_order_only: bool,
    pub max_uses_total: Option<u64>,
    pub max_uses_per_user: u64,
}

impl From<PromoCode> for PromoCodeResponse {
    fn from(promo: PromoCode) -> Self {
        let discount_value = match promo.discount {
            PromoDiscount::FixedAmount(amount) => amount.to_string(),
            PromoDiscount::Percentage(percent) => percent.to_string(),
        };

        Self {
            uuid: promo.uuid.into_uuid(),
            code: promo.code,
            discount_type: promo.discount.discount_type().as_str().to_string(),
            discount_value,
            min_order_amount: promo.min_order_amount,
            valid_from: promo.valid_from.to_string(),
            valid_until: promo.valid_until.map(|at| at.to_string()),
            is_active: promo.is_active,
            is_public: promo.is_public,
            first_order_only: promo.first_order_only,
            max_uses_total: promo.max_uses_total,
            max_uses_per_user: promo.max_uses_per_user,
        }
    }
}

/// Create Promo Code Handler
#[endpoint(
    tags("manager"),
    summary = "Create Promo Code",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Promo code created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid promo code data"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Managers only"),
        (status_code = StatusCode::CONFLICT, description = "Code already exists"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "manager.promo_codes.create",
    skip_all,
    fields(promo_code_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreatePromoCodeRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<PromoCodeResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_or_401()?.clone();
    let promo = json.into_inner().into_new_promo_code()?;

    let created = state
        .app
        .promo_codes
        .create_promo_code(actor, promo)
        .await
        .map_err(into_status_error)?;

    tracing::Span::current().record("promo_code_uuid", tracing::field::display(created.uuid));

    res.status_code(StatusCode::CREATED);

    Ok(Json(created.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use spareline::{identity::Identity, uuids::PromoCodeUuid};
    use spareline_app::domain::promo_codes::{MockPromoCodesService, PromoCodesServiceError};
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, manager, service_as};

    use super::*;

    fn make_service(promo_codes: MockPromoCodesService) -> Service {
        service_as(
            Mocks {
                promo_codes,
                ..Mocks::default()
            },
            Identity::Authenticated(manager()),
            Router::with_path("manager/promo-codes").post(handler),
        )
    }

    fn stored(promo: NewPromoCode) -> PromoCode {
        PromoCode {
            uuid: PromoCodeUuid::from_uuid(Uuid::from_u128(900)),
            code: promo.code.to_uppercase(),
            discount: promo.discount,
            min_order_amount: promo.min_order_amount,
            valid_from: promo.valid_from,
            valid_until: promo.valid_until,
            is_active: true,
            is_public: promo.is_public,
            first_order_only: promo.first_order_only,
            max_uses_total: promo.max_uses_total,
            max_uses_per_user: promo.max_uses_per_user,
        }
    }

    #[tokio::test]
    async fn creates_a_percentage_code_with_defaults() -> TestResult {
        let mut promo_codes = MockPromoCodesService::new();

        promo_codes
            .expect_create_promo_code()
            .once()
            .withf(|_, promo| {
                promo.discount == PromoDiscount::Percentage(Decimal::new(125, 1))
                    && promo.is_public
                    && promo.max_uses_per_user == 1
                    && promo.valid_until.is_none()
            })
            .return_once(|_, promo| Ok(stored(promo)));

        let mut res = TestClient::post("http://example.com/manager/promo-codes")
            .json(&json!({
                "code": "spring",
                "discount_type": "PERCENTAGE",
                "discount_value": "12.5",
            }))
            .send(&make_service(promo_codes))
            .await;

        let body: PromoCodeResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.code, "SPRING");
        assert_eq!(body.discount_type, "PERCENTAGE");
        assert_eq!(body.discount_value, "12.5");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_discount_type_returns_400() -> TestResult {
        let res = TestClient::post("http://example.com/manager/promo-codes")
            .json(&json!({
                "code": "spring",
                "discount_type": "BOGO",
                "discount_value": "1",
            }))
            .send(&make_service(MockPromoCodesService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn fractional_fixed_amount_returns_400() -> TestResult {
        let res = TestClient::post("http://example.com/manager/promo-codes")
            .json(&json!({
                "code": "spring",
                "discount_type": "FIXED_AMOUNT",
                "discount_value": "10.5",
            }))
            .send(&make_service(MockPromoCodesService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_code_returns_409() -> TestResult {
        let mut promo_codes = MockPromoCodesService::new();

        promo_codes
            .expect_create_promo_code()
            .once()
            .return_once(|_, _| Err(PromoCodesServiceError::AlreadyExists));

        let res = TestClient::post("http://example.com/manager/promo-codes")
            .json(&json!({
                "code": "spring",
                "discount_type": "FIXED_AMOUNT",
                "discount_value": "50000",
            }))
            .send(&make_service(promo_codes))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
