//! Bearer-token TLS reverse proxy for a local LLM inference server.
//!
//! # Architecture Overview
//!
//! ```text
//!   client ──TLS──▶ http::server ──▶ /.well-known/* ──▶ http::well_known
//!                        │
//!                        └──▶ /v1/* ──▶ auth::gate ──▶ proxy::logger
//!                                                          │
//!                                                          ▼
//!   client ◀── stream ◀── proxy::transport ◀── proxy::director ─▶ upstream
//! ```
//!
//! The only shared state is the immutable shared secret and the upstream
//! description; requests never observe one another.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;

pub use config::ProxyConfig;
pub use error::{ProxyError, StartupError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
