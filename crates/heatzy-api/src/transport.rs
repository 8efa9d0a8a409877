// Transport configuration for building the client's reqwest::Client.
//
// The Gizwits application id is a fixed header on every endpoint, so it is
// installed once as a default header instead of being added per request.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::error::Error;

/// Header carrying the vendor application identifier.
pub const APPLICATION_ID_HEADER: &str = "X-Gizwits-Application-Id";

/// Header carrying the user token on authenticated endpoints.
pub const USER_TOKEN_HEADER: &str = "X-Gizwits-User-Token";

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (intercepting proxies, local test rigs).
    DangerAcceptInvalid,
}

/// Transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` that sends `application_id` on every request.
    pub fn build_client(&self, application_id: &str) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(APPLICATION_ID_HEADER, HeaderValue::from_str(application_id)?);

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("heatzy-api/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
