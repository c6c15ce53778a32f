use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use llm_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use llm_proxy::lifecycle::{self, signals, Shutdown};
use llm_proxy::observability::init_logging;
use llm_proxy::StartupError;

#[derive(Parser)]
#[command(name = "llm-proxy")]
#[command(about = "TLS reverse proxy with bearer-token auth for an LLM inference server", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address (e.g., 0.0.0.0:443)
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,

    /// Upstream base URL (e.g., http://localhost:11434)
    #[arg(short, long, value_name = "URL")]
    upstream: Option<String>,

    /// Web root holding the .well-known directory
    #[arg(long, value_name = "DIR")]
    webroot: Option<String>,

    /// TLS certificate chain (PEM)
    #[arg(long, value_name = "FILE")]
    cert: Option<String>,

    /// TLS private key (PEM)
    #[arg(long, value_name = "FILE")]
    key: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(listen) = self.listen {
            config.listener.bind_address = listen;
        }
        if let Some(upstream) = self.upstream {
            config.upstream.url = upstream;
        }
        if let Some(webroot) = self.webroot {
            config.static_files.webroot = webroot;
        }
        if let Some(cert) = self.cert {
            config.listener.tls.cert_path = cert;
        }
        if let Some(key) = self.key {
            config.listener.tls.key_path = key;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        // Validated once, after overrides, so a flag can fix a bad file value.
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Args::parse().into_config();
    let level = config
        .as_ref()
        .map(|c| c.observability.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(&level);

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Result<ProxyConfig, ConfigError>) -> Result<(), StartupError> {
    let config = config?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        "Configuration loaded"
    );

    let server = lifecycle::bind(&config, |name| std::env::var(name).ok()).await?;
    tracing::info!(
        address = %config.listener.bind_address,
        "Server is running"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(&shutdown);

    server.serve(server_shutdown).await
}
