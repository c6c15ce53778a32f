//! The process-wide shared secret.

use std::fmt;

use thiserror::Error;

/// Error raised when the shared secret cannot be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretError {
    #[error("{0} environment variable not set")]
    Missing(String),
}

/// Static bearer token required on every proxied request.
///
/// Loaded once at startup and never mutated. Only the precomputed
/// `Authorization` value is kept.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret {
    expected_header: String,
}

impl SharedSecret {
    /// Build a secret from its raw value. Empty values are rejected.
    pub fn new(var: &str, value: impl Into<String>) -> Result<Self, SecretError> {
        let value = value.into();
        if value.is_empty() {
            return Err(SecretError::Missing(var.to_string()));
        }
        Ok(Self {
            expected_header: format!("Bearer {}", value),
        })
    }

    /// Load the secret through an arbitrary variable lookup.
    pub fn from_lookup<F>(var: &str, lookup: F) -> Result<Self, SecretError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let value = lookup(var).ok_or_else(|| SecretError::Missing(var.to_string()))?;
        Self::new(var, value)
    }

    /// Exact `Authorization` header value that passes the gate.
    pub fn expected_header(&self) -> &str {
        &self.expected_header
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}
