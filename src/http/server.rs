//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with both routes
//! - Serve ACME challenge files and directory listings without authentication
//! - Redirect a bare `/v1` to `/v1/`
//! - Gate `/v1/*` behind the bearer token and dispatch to the proxy
//! - Wire up request tracing
//! - Serve over TLS, or plaintext when embedded behind another terminator

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::auth::{require_bearer, SharedSecret};
use crate::http::redirect::add_trailing_slash;
use crate::http::well_known::{serve_well_known, WellKnown};
use crate::proxy::{proxy_handler, ProxyState, Upstream};

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    shutdown_grace: Duration,
}

impl HttpServer {
    /// Create a new server from its already-validated parts.
    pub fn new(secret: SharedSecret, upstream: Upstream, webroot: &Path) -> Self {
        let state = ProxyState::new(upstream);
        let router = Self::build_router(Arc::new(secret), state, webroot);
        Self {
            router,
            shutdown_grace: Duration::from_secs(10),
        }
    }

    /// How long in-flight requests may run after shutdown is triggered.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    fn build_router(secret: Arc<SharedSecret>, state: ProxyState, webroot: &Path) -> Router {
        let api = Router::new()
            .route("/v1/", any(proxy_handler))
            .route("/v1/{*path}", any(proxy_handler))
            .with_state(state)
            .route_layer(middleware::from_fn_with_state(secret, require_bearer));

        let challenges = Router::new()
            .route("/.well-known", get(serve_well_known))
            .route("/.well-known/", get(serve_well_known))
            .route("/.well-known/{*path}", get(serve_well_known))
            .with_state(Arc::new(WellKnown::new(webroot)));

        Router::new()
            .merge(api)
            .route("/v1", any(add_trailing_slash))
            .merge(challenges)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve plaintext HTTP on an already-bound listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on an already-bound listener.
    pub async fn run_tls(
        self,
        listener: std::net::TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = Handle::new();
        let grace = self.shutdown_grace;
        let signal_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!(grace_secs = grace.as_secs(), "Shutdown signal received");
            signal_handle.graceful_shutdown(Some(grace));
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum_server::from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}
