//! Bearer-token gate for the proxied API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::AUTHORIZATION, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::SharedSecret;
use crate::proxy::logger::client_ip;

/// Returns true when the header is exactly `"Bearer " + secret`.
///
/// A missing header compares as the empty string.
pub fn is_authorized(header: Option<&HeaderValue>, secret: &SharedSecret) -> bool {
    let presented = header.map(HeaderValue::as_bytes).unwrap_or_default();
    presented == secret.expected_header().as_bytes()
}

/// Rejects any request whose `Authorization` header does not match.
pub async fn require_bearer(
    State(secret): State<Arc<SharedSecret>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if is_authorized(request.headers().get(AUTHORIZATION), &secret) {
        return next.run(request).await;
    }

    tracing::warn!(
        client_ip = %client_ip(&remote.to_string()),
        path = %request.uri().path(),
        "Rejected request with invalid credentials"
    );
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}
