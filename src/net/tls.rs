//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;
use crate::error::StartupError;

/// Check that both PEM files exist. The certificate is checked first.
pub fn ensure_tls_files(tls: &TlsConfig) -> Result<(), StartupError> {
    if !Path::new(&tls.cert_path).exists() {
        return Err(StartupError::CertNotFound(tls.cert_path.clone()));
    }
    if !Path::new(&tls.key_path).exists() {
        return Err(StartupError::KeyNotFound(tls.key_path.clone()));
    }
    Ok(())
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, StartupError> {
    ensure_tls_files(tls)?;

    RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(StartupError::Tls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tls_in(dir: &Path, cert: &str, key: &str) -> TlsConfig {
        TlsConfig {
            cert_path: dir.join(cert).display().to_string(),
            key_path: dir.join(key).display().to_string(),
        }
    }

    #[test]
    fn missing_cert_is_reported_first() {
        let dir = tempfile::tempdir().unwrap();
        let tls = tls_in(dir.path(), "fullchain.pem", "privkey.pem");

        let err = ensure_tls_files(&tls).unwrap_err();
        assert!(matches!(err, StartupError::CertNotFound(ref p) if p == &tls.cert_path));
    }

    #[test]
    fn missing_key_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fullchain.pem"), "cert").unwrap();
        let tls = tls_in(dir.path(), "fullchain.pem", "privkey.pem");

        let err = ensure_tls_files(&tls).unwrap_err();
        assert!(matches!(err, StartupError::KeyNotFound(ref p) if p == &tls.key_path));
    }

    #[tokio::test]
    async fn garbage_pem_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fullchain.pem"), "not a certificate").unwrap();
        std::fs::write(dir.path().join("privkey.pem"), "not a key").unwrap();
        let tls = tls_in(dir.path(), "fullchain.pem", "privkey.pem");

        assert!(ensure_tls_files(&tls).is_ok());
        let err = load_tls_config(&tls).await.unwrap_err();
        assert!(matches!(err, StartupError::Tls(_)));
    }
}
