//! Startup orchestration.
//!
//! Fail fast: the shared secret, the certificate, and the private key are
//! all checked before the socket is bound, in that order.

use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use tokio::sync::broadcast;

use crate::auth::SharedSecret;
use crate::config::ProxyConfig;
use crate::error::StartupError;
use crate::http::HttpServer;
use crate::net::tls::load_tls_config;
use crate::proxy::Upstream;

/// A fully initialized server whose socket is bound but not yet serving.
pub struct BoundServer {
    server: HttpServer,
    listener: TcpListener,
    tls: RustlsConfig,
}

impl BoundServer {
    /// Address the listener actually bound, which matters for port 0.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until a shutdown signal arrives.
    pub async fn serve(self, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
        self.server
            .run_tls(self.listener, self.tls, shutdown)
            .await
            .map_err(StartupError::Serve)
    }
}

/// Validate every precondition, then bind the listener.
///
/// `lookup` resolves environment variables; pass `|k| std::env::var(k).ok()`
/// in production.
pub async fn bind<F>(config: &ProxyConfig, lookup: F) -> Result<BoundServer, StartupError>
where
    F: FnOnce(&str) -> Option<String>,
{
    let secret = SharedSecret::from_lookup(&config.auth.api_key_env, lookup)?;
    let tls = load_tls_config(&config.listener.tls).await?;

    let upstream = Upstream::parse(&config.upstream.url)?;

    let server = HttpServer::new(secret, upstream, Path::new(&config.static_files.webroot))
        .with_shutdown_grace(Duration::from_secs(config.listener.shutdown_grace_secs));

    let listener =
        TcpListener::bind(&config.listener.bind_address).map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    tracing::info!(
        address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        webroot = %config.static_files.webroot,
        "Listener bound"
    );

    Ok(BoundServer {
        server,
        listener,
        tls,
    })
}
