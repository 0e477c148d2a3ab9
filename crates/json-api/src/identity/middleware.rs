//! Identity middleware.
//!
//! Resolves the request identity from `Authorization: Bearer` and
//! `X-Anonymous-Token`. Visitors without usable credentials get a new anonymous
//! identity, returned in the `X-Anonymous-Token` response header.

use std::sync::Arc;

use salvo::{
    http::header::{AUTHORIZATION, HeaderValue},
    prelude::*,
};
use tracing::{error, warn};

use crate::{extensions::*, state::State};

pub(crate) const ANONYMOUS_TOKEN_HEADER: &str = "x-anonymous-token";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let session_token = extract_bearer_token(req).map(str::to_string);
    let anonymous_token = req
        .header::<String>(ANONYMOUS_TOKEN_HEADER)
        .filter(|token| !token.trim().is_empty());

    let resolved = match depot.obtain_or_500::<Arc<State>>() {
        Ok(state) => {
            state
                .app
                .identity
                .resolve(session_token, anonymous_token)
                .await
        }
        Err(status) => {
            res.render(status);

            return;
        }
    };

    let resolved = match resolved {
        Ok(resolved) => resolved,
        Err(source) => {
            error!("failed to resolve request identity: {source}");

            res.render(StatusError::internal_server_error());

            return;
        }
    };

    if let Some(token) = resolved.issued_anonymous_token {
        match HeaderValue::from_str(&token) {
            Ok(value) => {
                res.headers_mut().insert(ANONYMOUS_TOKEN_HEADER, value);
            }
            Err(source) => warn!("issued anonymous token is not a valid header value: {source}"),
        }
    }

    depot.insert_identity(resolved.identity);

    ctrl.call_next(req, depot, res).await;
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}
