//! Per-endpoint TLS settings

use serde::Deserialize;
use std::path::PathBuf;

/// TLS settings, used only when the endpoint has TLS enabled
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Accept invalid certificates and hostnames (insecure)
    pub skip_verify: bool,
    /// PEM bundle to trust in addition to the system roots
    pub ca_cert: Option<PathBuf>,
    /// PEM client certificate, paired with `client_key`
    pub client_cert: Option<PathBuf>,
    /// PKCS#8 PEM private key
    pub client_key: Option<PathBuf>,
    /// Server name sent in the handshake instead of the endpoint host
    pub sni: Option<String>,
}

impl TlsConfig {
    /// Name to verify the server certificate against
    pub fn server_name<'a>(&'a self, host: &'a str) -> &'a str {
        self.sni.as_deref().unwrap_or(host)
    }

    /// Build a native-tls connector from these settings
    #[cfg(feature = "native-tls-backend")]
    pub fn build_connector(&self) -> Result<native_tls::TlsConnector, crate::utils::StoreError> {
        use crate::utils::StoreError;
        use native_tls::{Certificate, Identity, TlsConnector};

        let read = |path: &PathBuf, what: &str| {
            std::fs::read(path)
                .map_err(|e| StoreError::Tls(format!("Failed to read {} {:?}: {}", what, path, e)))
        };

        let mut builder = TlsConnector::builder();

        if self.skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }

        if let Some(ref ca_path) = self.ca_cert {
            let cert = Certificate::from_pem(&read(ca_path, "CA cert")?)
                .map_err(|e| StoreError::Tls(format!("Invalid CA cert: {}", e)))?;
            builder.add_root_certificate(cert);
        }

        if let (Some(cert_path), Some(key_path)) = (&self.client_cert, &self.client_key) {
            let identity =
                Identity::from_pkcs8(&read(cert_path, "client cert")?, &read(key_path, "client key")?)
                    .map_err(|e| StoreError::Tls(format!("Invalid client identity: {}", e)))?;
            builder.identity(identity);
        }

        builder
            .build()
            .map_err(|e| StoreError::Tls(format!("Failed to build TLS connector: {}", e)))
    }
}
