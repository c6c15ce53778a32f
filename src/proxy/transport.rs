//! Upstream round trips.
//!
//! Wraps a plain hyper client. Responses are passed through as streams with
//! hop-by-hop headers removed and, for event streams, the content type forced.

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::error::ProxyError;
use crate::proxy::director::{strip_hop_by_hop, EVENT_STREAM};

/// Performs the outbound call and fixes streamed response headers.
#[derive(Clone)]
pub struct StreamTransport {
    client: Client<HttpConnector, Body>,
}

impl StreamTransport {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }

    /// Send `request` and return the upstream response with a streaming body.
    ///
    /// `event_stream` reflects the inbound `Accept` header. Errors are
    /// returned unchanged and never retried. Dropping the returned future
    /// or body abandons the upstream connection.
    pub async fn round_trip(
        &self,
        request: Request<Body>,
        event_stream: bool,
    ) -> Result<Response<Body>, ProxyError> {
        let response: Response<Incoming> = self.client.request(request).await?;
        let (mut parts, body) = response.into_parts();

        strip_hop_by_hop(&mut parts.headers);
        if event_stream {
            parts
                .headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(EVENT_STREAM));
        }

        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

impl Default for StreamTransport {
    fn default() -> Self {
        Self::new()
    }
}
