//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Path as UrlPath, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use futures_util::stream;
use llm_proxy::auth::SharedSecret;
use llm_proxy::proxy::Upstream;
use llm_proxy::{HttpServer, Shutdown};
use tokio::net::TcpListener;

pub const SECRET: &str = "s3cr3t-token";

/// Handle on a running stub upstream.
#[derive(Clone, Default)]
pub struct StubUpstream {
    pub calls: Arc<AtomicUsize>,
    /// Set once the body of `/v1/stream/endless` is dropped.
    pub endless_dropped: Arc<AtomicBool>,
}

impl StubUpstream {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Start a stub upstream that records calls and echoes requests.
///
/// - `/v1/status/{code}` answers with that status and a plain body
/// - `/v1/raw` echoes the request body bytes verbatim
/// - `/v1/stream` emits three chunks labelled `application/json`
/// - `/v1/stream/endless` emits chunks until the client goes away
/// - anything else returns a JSON description of the request
pub async fn start_stub_upstream() -> (SocketAddr, StubUpstream) {
    let stub = StubUpstream::default();

    let app = Router::new()
        .route("/v1/status/{code}", any(status))
        .route("/v1/raw", any(raw))
        .route("/v1/stream", any(chunks))
        .route("/v1/stream/endless", any(endless))
        .fallback(echo)
        .layer(middleware::from_fn_with_state(stub.clone(), count_calls))
        .with_state(stub.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, stub)
}

async fn count_calls(State(stub): State<StubUpstream>, request: Request, next: Next) -> Response {
    stub.calls.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

async fn echo(request: Request) -> Json<serde_json::Value> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    Json(serde_json::json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "host": header("host"),
        "x_forwarded_host": header("x-forwarded-host"),
        "x_forwarded_for": header("x-forwarded-for"),
        "authorization": header("authorization"),
        "accept": header("accept"),
        "body_len": body.len(),
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn status(UrlPath(code): UrlPath<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("status {}", code),
    )
        .into_response()
}

async fn raw(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/octet-stream")], body).into_response()
}

async fn chunks() -> Response {
    let parts = ["data: one\n\n", "data: two\n\n", "data: [DONE]\n\n"];
    let body = Body::from_stream(stream::unfold(0usize, move |i| async move {
        if i >= parts.len() {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        Some((Ok::<_, std::io::Error>(Bytes::from_static(parts[i].as_bytes())), i + 1))
    }));

    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "private"),
        ],
        body,
    )
        .into_response()
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

async fn endless(State(stub): State<StubUpstream>) -> Response {
    let guard = DropFlag(stub.endless_dropped.clone());
    let body = Body::from_stream(stream::unfold(guard, |guard| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Some((
            Ok::<_, std::io::Error>(Bytes::from_static(b"data: tick\n\n")),
            guard,
        ))
    }));

    ([(header::CONTENT_TYPE, "application/x-ndjson")], body).into_response()
}

/// Start the proxy in front of `upstream` on an ephemeral plaintext port.
pub async fn start_proxy(upstream: &str, webroot: &Path) -> (SocketAddr, Shutdown) {
    let secret = SharedSecret::new("API_KEY", SECRET).unwrap();
    let upstream = Upstream::parse(upstream).unwrap();
    let server = HttpServer::new(secret, upstream, webroot);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Like [`client`], but hands redirects back to the caller.
pub fn client_without_redirects() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

pub fn bearer() -> String {
    format!("Bearer {}", SECRET)
}
