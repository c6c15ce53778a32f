//! Request body capture for logging.
//!
//! The body is read into memory once, logged, and handed back as a
//! replayable byte sequence. There is no size cap: inference API payloads
//! are small JSON documents.

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::Request;
use futures_util::stream;

/// A request whose body has already been consumed and can be replayed.
#[derive(Debug)]
pub struct CapturedRequest {
    pub parts: Parts,
    pub body: CapturedBody,
    pub client_ip: String,
}

/// Outcome of reading the inbound body.
#[derive(Debug)]
pub enum CapturedBody {
    Complete(Bytes),
    /// The body could not be read. Forwarding replays the failure.
    Unreadable(String),
}

impl CapturedRequest {
    /// Read the full body, log it, and keep the bytes for forwarding.
    pub async fn capture(request: Request<Body>, remote_addr: &str) -> Self {
        let (parts, body) = request.into_parts();
        let client_ip = client_ip(remote_addr);

        let body = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                tracing::info!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    client_ip = %client_ip,
                    body = %String::from_utf8_lossy(&bytes),
                    "Received request"
                );
                CapturedBody::Complete(bytes)
            }
            Err(e) => {
                tracing::error!(
                    method = %parts.method,
                    path = %parts.uri.path(),
                    client_ip = %client_ip,
                    error = %e,
                    "Failed to read request body"
                );
                CapturedBody::Unreadable(e.to_string())
            }
        };

        Self {
            parts,
            body,
            client_ip,
        }
    }

    /// Body for the outbound request, equivalent to the one received.
    pub fn replay_body(&self) -> Body {
        match &self.body {
            CapturedBody::Complete(bytes) => Body::from(bytes.clone()),
            CapturedBody::Unreadable(reason) => {
                let err = std::io::Error::other(reason.clone());
                Body::from_stream(stream::once(async move { Err::<Bytes, _>(err) }))
            }
        }
    }
}

/// Resolve the host part of a remote address.
///
/// Falls back to the raw string when it is not a `host:port` pair.
pub fn client_ip(remote_addr: &str) -> String {
    split_host(remote_addr)
        .map(str::to_string)
        .unwrap_or_else(|| {
            tracing::debug!(remote_addr, "Remote address has no port, logging it verbatim");
            remote_addr.to_string()
        })
}

fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        after.strip_prefix(':')?;
        return Some(host);
    }

    let (host, _port) = addr.rsplit_once(':')?;
    if host.contains(':') {
        // Unbracketed IPv6 literal.
        return None;
    }
    Some(host)
}
