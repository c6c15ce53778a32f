//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! The defaults reproduce the fixed deployment the proxy was written for,
//! so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// The single upstream every `/v1/*` request is forwarded to.
    pub upstream: UpstreamConfig,

    /// ACME challenge file serving.
    pub static_files: StaticFilesConfig,

    /// Bearer-token authentication.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:443").
    pub bind_address: String,

    /// TLS material. The listener never serves plaintext.
    pub tls: TlsConfig,

    /// Seconds to let in-flight streams finish after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:443".to_string(),
            tls: TlsConfig::default(),
            shutdown_grace_secs: 10,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate chain file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: "/etc/letsencrypt/live/api.seudominio.com/fullchain.pem".to_string(),
            key_path: "/etc/letsencrypt/live/api.seudominio.com/privkey.pem".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the inference server (e.g., "http://localhost:11434").
    pub url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
        }
    }
}

/// Static file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Web root. Challenge files are served from `<webroot>/.well-known`.
    pub webroot: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            webroot: "/var/www/html".to_string(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Name of the environment variable holding the shared secret.
    /// The secret itself never lives in the config file.
    pub api_key_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: "API_KEY".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:443");
        assert_eq!(config.upstream.url, "http://localhost:11434");
        assert_eq!(config.static_files.webroot, "/var/www/html");
        assert_eq!(config.auth.api_key_env, "API_KEY");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [upstream]
            url = "http://10.0.0.5:8000"

            [listener.tls]
            cert_path = "/tmp/cert.pem"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.url, "http://10.0.0.5:8000");
        assert_eq!(config.listener.tls.cert_path, "/tmp/cert.pem");
        assert_eq!(
            config.listener.tls.key_path,
            "/etc/letsencrypt/live/api.seudominio.com/privkey.pem"
        );
        assert_eq!(config.listener.bind_address, "0.0.0.0:443");
    }
}
