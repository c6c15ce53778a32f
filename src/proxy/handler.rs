//! The `/v1/*` request pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
};

use crate::error::ProxyError;
use crate::proxy::director::{self, Upstream};
use crate::proxy::logger::CapturedRequest;
use crate::proxy::transport::StreamTransport;

/// State shared by every proxied request. Read-only after startup.
#[derive(Clone)]
pub struct ProxyState {
    pub upstream: Arc<Upstream>,
    pub transport: StreamTransport,
}

impl ProxyState {
    pub fn new(upstream: Upstream) -> Self {
        Self {
            upstream: Arc::new(upstream),
            transport: StreamTransport::new(),
        }
    }
}

/// Logs and forwards an authenticated request.
pub async fn proxy_handler(
    State(state): State<ProxyState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let captured = CapturedRequest::capture(request, &remote.to_string()).await;
    let event_stream = director::wants_event_stream(&captured.parts.headers);

    let mut response = match forward(&state, &captured, event_stream).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                method = %captured.parts.method,
                path = %captured.parts.uri.path(),
                upstream = %state.upstream.authority(),
                error = %e,
                "Proxy error"
            );
            e.into_response()
        }
    };

    // Primed streaming headers win over whatever the upstream sent, and a
    // gateway error carries them as well.
    if event_stream {
        director::prime_stream_headers(response.headers_mut());
    }
    response
}

async fn forward(
    state: &ProxyState,
    captured: &CapturedRequest,
    event_stream: bool,
) -> Result<Response, ProxyError> {
    let outbound = director::rewrite(
        &captured.parts,
        captured.replay_body(),
        &state.upstream,
        &captured.client_ip,
    )?;

    tracing::debug!(uri = %outbound.uri(), event_stream, "Forwarding request upstream");
    state.transport.round_trip(outbound, event_stream).await
}
