//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! startup:  env var (name from config) → secret.rs → Arc<SharedSecret>
//! request:  /v1/* → gate.rs (compare Authorization) → proxy handler | 401
//! ```
//!
//! # Design Decisions
//! - One global gate, re-evaluated on every request, no session caching
//! - The secret is injected as router state, never read from a global

pub mod gate;
pub mod secret;

pub use gate::{is_authorized, require_bearer};
pub use secret::{SecretError, SharedSecret};
