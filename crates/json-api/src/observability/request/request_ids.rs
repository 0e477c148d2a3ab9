//! Request ids.

use salvo::{http::header::HeaderValue, prelude::Response};
use tracing::warn;
use uuid::Uuid;

pub(super) const REQUEST_ID_HEADER: &str = "x-request-id";

const REQUEST_ID_MAX: usize = 128;

/// Reuse the caller's id when it is usable, otherwise mint one.
pub(super) fn resolve(header: Option<String>) -> String {
    header
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty() && value.len() <= REQUEST_ID_MAX)
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

pub(super) fn echo(res: &mut Response, request_id: &str) {
    match HeaderValue::from_str(request_id) {
        Ok(value) => {
            res.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        Err(source) => warn!(request_id, "request id is not a valid header value: {source}"),
    }
}
