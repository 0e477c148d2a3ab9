//! Verify Login Code Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline_app::domain::identity::records::IssuedSession;

use crate::{extensions::*, identity::errors::into_status_error, state::State};

/// Verify Login Code Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VerifyOtpRequest {
    /// Phone number the code was sent to
    pub phone: String,

    /// Six-digit code
    pub code: String,
}

/// Signed-in user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SessionUserResponse {
    pub uuid: Uuid,
    pub phone: String,
    pub role: String,
}

/// Session Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SessionResponse {
    /// Bearer token for subsequent requests
    pub token: String,

    /// When the session ends
    pub expires_at: String,

    pub user: SessionUserResponse,

    /// Whether an anonymous cart and favorites were merged into the user
    pub merged_anonymous: bool,
}

impl From<IssuedSession> for SessionResponse {
    fn from(session: IssuedSession) -> Self {
        Self {
            token: session.token,
            expires_at: session.expires_at.to_string(),
            user: SessionUserResponse {
                uuid: session.user.uuid.into_uuid(),
                phone: session.user.phone,
                role: session.user.role.to_string(),
            },
            merged_anonymous: session.merged_anonymous,
        }
    }
}

/// Verify Login Code Handler
///
/// Opens a session. Anything the visitor collected anonymously moves to the user.
#[endpoint(
    tags("auth"),
    summary = "Verify Login Code",
    responses(
        (status_code = StatusCode::OK, description = "Session opened"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid phone number"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Wrong, expired or exhausted code"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "auth.otp.verify",
    skip_all,
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<VerifyOtpRequest>,
    depot: &mut Depot,
) -> Result<Json<SessionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_500()?.clone();
    let request = json.into_inner();

    let session = state
        .app
        .identity
        .verify_otp(request.phone, request.code, identity)
        .await
        .map_err(into_status_error)?;

    tracing::Span::current().record("user_uuid", tracing::field::display(session.user.uuid));

    Ok(Json(session.into()))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use spareline::identity::Identity;
    use spareline_app::domain::identity::{IdentityServiceError, MockIdentityService};
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, anonymous, customer, service_as};

    use super::*;

    fn make_service(identity: MockIdentityService) -> Service {
        service_as(
            Mocks {
                identity,
                ..Mocks::default()
            },
            anonymous(),
            Router::with_path("auth/otp/verify").post(handler),
        )
    }

    #[tokio::test]
    async fn verifies_code_with_the_anonymous_identity() -> TestResult {
        let user = customer();
        let uuid = user.uuid;

        let mut identity = MockIdentityService::new();

        identity
            .expect_verify_otp()
            .once()
            .withf(|phone, code, identity| {
                phone == "+79990000001"
                    && code == "123456"
                    && matches!(identity, Identity::Anonymous(_))
            })
            .return_once(move |_, _, _| {
                Ok(IssuedSession {
                    token: "ss_v1_issued".to_string(),
                    expires_at: Timestamp::UNIX_EPOCH,
                    user,
                    merged_anonymous: true,
                })
            });

        let mut res = TestClient::post("http://example.com/auth/otp/verify")
            .json(&json!({ "phone": "+79990000001", "code": "123456" }))
            .send(&make_service(identity))
            .await;

        let body: SessionResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.token, "ss_v1_issued");
        assert_eq!(body.user.uuid, uuid.into_uuid());
        assert_eq!(body.user.role, "customer");
        assert!(body.merged_anonymous, "merge reported");

        Ok(())
    }

    #[tokio::test]
    async fn wrong_code_returns_401() -> TestResult {
        let mut identity = MockIdentityService::new();

        identity
            .expect_verify_otp()
            .once()
            .return_once(|_, _, _| Err(IdentityServiceError::InvalidCode));

        let res = TestClient::post("http://example.com/auth/otp/verify")
            .json(&json!({ "phone": "+79990000001", "code": "000000" }))
            .send(&make_service(identity))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
