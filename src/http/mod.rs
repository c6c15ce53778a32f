//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection
//!     → server.rs (Axum router)
//!         /.well-known/* → well_known.rs (files, listings; no auth)
//!         /v1            → 301 /v1/
//!         /v1/*          → auth::require_bearer → proxy::proxy_handler
//!         anything else  → 404
//! ```

pub mod redirect;
pub mod server;
pub mod well_known;

pub use server::HttpServer;
