//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → tls.rs (cert/key presence, PEM load)
//!     → lifecycle::startup binds the socket
//!     → http::server accepts TLS connections
//! ```
//!
//! # Design Decisions
//! - TLS is mandatory for the public listener
//! - Missing cert or key is fatal, never silently degraded

pub mod tls;

pub use tls::{ensure_tls_files, load_tls_config};
