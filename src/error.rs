//! Error taxonomy.
//!
//! Startup errors are fatal and terminate the process. Everything else is
//! scoped to a single request and rendered as a terse status response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::SecretError;
use crate::config::ConfigError;
use crate::proxy::director::UpstreamError;

/// Conditions that abort startup before the listener accepts traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Cert not found: {0}")]
    CertNotFound(String),

    #[error("Cert pk not found: {0}")]
    KeyNotFound(String),

    #[error("failed to load TLS material: {0}")]
    Tls(std::io::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Per-request forwarding failures.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("could not build upstream request: {0}")]
    Rewrite(#[from] axum::http::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        // Detail goes to the log, never to the caller.
        (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
    }
}
