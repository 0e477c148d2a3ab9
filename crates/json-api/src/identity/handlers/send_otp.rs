//! Send Login Code Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, identity::errors::into_status_error, state::State};

/// Send Login Code Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SendOtpRequest {
    /// Phone number in any common spelling
    pub phone: String,
}

/// Login Code Sent Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OtpSentResponse {
    /// Normalised phone number the code was sent to
    pub phone: String,

    /// When the code stops working
    pub expires_at: String,
}

/// Send Login Code Handler
#[endpoint(
    tags("auth"),
    summary = "Send Login Code",
    responses(
        (status_code = StatusCode::OK, description = "Code sent"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid phone number"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "auth.otp.send", skip_all, err)]
pub(crate) async fn handler(
    json: JsonBody<SendOtpRequest>,
    depot: &mut Depot,
) -> Result<Json<OtpSentResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let challenge = state
        .app
        .identity
        .send_otp(json.into_inner().phone)
        .await
        .map_err(into_status_error)?;

    Ok(Json(OtpSentResponse {
        phone: challenge.phone,
        expires_at: challenge.expires_at.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use spareline::errors::ValidationError;
    use spareline_app::domain::identity::{
        IdentityServiceError, MockIdentityService, records::OtpChallenge,
    };
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, anonymous, service_as};

    use super::*;

    fn make_service(identity: MockIdentityService) -> Service {
        service_as(
            Mocks {
                identity,
                ..Mocks::default()
            },
            anonymous(),
            Router::with_path("auth/otp").post(handler),
        )
    }

    #[tokio::test]
    async fn sends_code_to_normalised_phone() -> TestResult {
        let mut identity = MockIdentityService::new();

        identity
            .expect_send_otp()
            .once()
            .withf(|phone| phone == "8 (916) 123-45-67")
            .return_once(|_| {
                Ok(OtpChallenge {
                    phone: "+79161234567".to_string(),
                    expires_at: Timestamp::UNIX_EPOCH,
                })
            });

        let mut res = TestClient::post("http://example.com/auth/otp")
            .json(&json!({ "phone": "8 (916) 123-45-67" }))
            .send(&make_service(identity))
            .await;

        let body: OtpSentResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.phone, "+79161234567");

        Ok(())
    }

    #[tokio::test]
    async fn invalid_phone_returns_400() -> TestResult {
        let mut identity = MockIdentityService::new();

        identity
            .expect_send_otp()
            .once()
            .return_once(|_| Err(IdentityServiceError::Validation(ValidationError::Phone)));

        let res = TestClient::post("http://example.com/auth/otp")
            .json(&json!({ "phone": "12345" }))
            .send(&make_service(identity))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
