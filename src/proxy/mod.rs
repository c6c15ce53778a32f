//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! authenticated request
//!     → logger.rs    (buffer body, log method/path/ip/body, keep bytes)
//!     → director.rs  (pure rewrite: URI, Host, X-Forwarded-*, hop-by-hop)
//!     → transport.rs (round trip, content-type fix for event streams)
//!     → handler.rs   (prime streaming headers, stream body back)
//! ```
//!
//! # Design Decisions
//! - One fixed upstream; this is a one-to-one proxy, not a router
//! - Response bodies are never buffered
//! - Upstream failures become a bare 502 and are not retried

pub mod director;
pub mod handler;
pub mod logger;
pub mod transport;

pub use director::Upstream;
pub use handler::{proxy_handler, ProxyState};
pub use transport::StreamTransport;
