//! Static bearer-token check.

use std::sync::Arc;

use http::header::AUTHORIZATION;
use http::request::Parts;
use http::{HeaderMap, StatusCode};
use tracing::warn;

use crate::handler::{Guarded, Handler};
use crate::response::Response;

/// True when `authorization` is exactly `Bearer <token>`.
pub fn is_authorized(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.as_bytes().strip_prefix(b"Bearer "))
        .is_some_and(|presented| presented == token.as_bytes())
}

/// Rejects requests without the right token with `401` before `handler`
/// sees them.
///
/// The check needs only the request head, so the server makes it before
/// reading the body: an unauthenticated upload costs no buffering.
pub fn bearer(token: Arc<str>, handler: impl Handler) -> impl Handler {
    Guarded::new(
        move |head: &Parts| {
            if is_authorized(&head.headers, &token) {
                return None;
            }
            warn!(path = head.uri.path(), "rejected unauthorized request");
            Some(Response::builder().status(StatusCode::UNAUTHORIZED).text("Unauthorized"))
        },
        handler,
    )
}
