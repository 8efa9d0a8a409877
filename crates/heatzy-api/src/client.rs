// Heatzy HTTP client
//
// Owns the reqwest transport and the token cache, builds endpoint URLs,
// and wraps requests with the user-token header. Endpoint operations live
// in `auth.rs` and `devices.rs` as inherent methods.

use reqwest::StatusCode;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::Authentication;
use crate::transport::{TransportConfig, USER_TOKEN_HEADER};

/// Production endpoint of the Gizwits cloud used by Heatzy devices.
pub const HEATZY_API_URL: &str = "https://euapi.gizwits.com/app";

/// Application identifier the Heatzy mobile apps register with Gizwits.
pub const HEATZY_APPLICATION_ID: &str = "c70a66ff039d41b4a220e198b0fcc8b3";

/// Connection settings for a [`HeatzyClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; endpoint paths are appended to it.
    pub base_url: String,
    /// Sent as `X-Gizwits-Application-Id` on every request.
    pub application_id: String,
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: HEATZY_API_URL.into(),
            application_id: HEATZY_APPLICATION_ID.into(),
            transport: TransportConfig::default(),
        }
    }
}

/// Async client for the Heatzy cloud API.
///
/// One instance holds one set of credentials and one cached token. The
/// token is refreshed lazily when it is absent or past `expire_at`, and
/// refreshes are serialized so concurrent calls trigger a single login.
pub struct HeatzyClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    pub(crate) authentication: Mutex<Option<Authentication>>,
}

impl HeatzyClient {
    /// Create a client, building its HTTP transport from `config`.
    pub fn new(credentials: Credentials, config: &ClientConfig) -> Result<Self, Error> {
        let http = config.transport.build_client(&config.application_id)?;
        Self::with_client(http, credentials, &config.base_url)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for the `X-Gizwits-Application-Id` default
    /// header (see [`TransportConfig::build_client`]).
    pub fn with_client(
        http: reqwest::Client,
        credentials: Credentials,
        base_url: &str,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self {
            http,
            base_url,
            credentials,
            authentication: Mutex::new(None),
        })
    }

    /// The API root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The account this client authenticates as.
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Tear the client down, discarding the cached token and the transport.
    pub fn close(self) {
        let had_token = self.authentication.into_inner().is_some();
        debug!(username = %self.credentials.username, had_token, "closing client");
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    ///
    /// `endpoint(&["devdata", "abc", "latest"])` on `https://host/app`
    /// yields `https://host/app/devdata/abc/latest`.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET, returning the status and raw body.
    pub(crate) async fn get(&self, url: Url) -> Result<(StatusCode, String), Error> {
        let token = self.user_token_header().await?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(USER_TOKEN_HEADER, token)
            .send()
            .await?;

        Self::read(resp).await
    }

    /// Send an authenticated POST with a JSON body, returning the status and raw body.
    pub(crate) async fn post(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<(StatusCode, String), Error> {
        let token = self.user_token_header().await?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(USER_TOKEN_HEADER, token)
            .json(body)
            .send()
            .await?;

        Self::read(resp).await
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    async fn user_token_header(&self) -> Result<HeaderValue, Error> {
        let token = self.get_token().await?;
        let mut value = HeaderValue::from_str(&token)?;
        value.set_sensitive(true);
        Ok(value)
    }

    async fn read(resp: reqwest::Response) -> Result<(StatusCode, String), Error> {
        let status = resp.status();
        let body = resp.text().await?;
        trace!(%status, %body, "response");
        Ok((status, body))
    }
}

/// Decode a JSON body regardless of the declared content type.
///
/// The backend labels JSON responses as `text/html`, so bodies are read as
/// text and parsed here rather than through `Response::json`.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> HeatzyClient {
        HeatzyClient::with_client(
            reqwest::Client::new(),
            Credentials::new("user@example.com", "secret"),
            base,
        )
        .unwrap()
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = client("https://euapi.gizwits.com/app");
        assert_eq!(
            client.endpoint(&["devdata", "d1", "latest"]).as_str(),
            "https://euapi.gizwits.com/app/devdata/d1/latest"
        );
    }

    #[test]
    fn endpoint_handles_trailing_slash_and_bare_host() {
        assert_eq!(
            client("https://host/app/").endpoint(&["login"]).as_str(),
            "https://host/app/login"
        );
        assert_eq!(
            client("http://127.0.0.1:8080").endpoint(&["bindings"]).as_str(),
            "http://127.0.0.1:8080/bindings"
        );
    }

    #[test]
    fn endpoint_escapes_device_ids() {
        let url = client("https://host").endpoint(&["control", "a/b c"]);
        assert_eq!(url.as_str(), "https://host/control/a%2Fb%20c");
    }

    #[test]
    fn rejects_non_base_urls() {
        let result = HeatzyClient::with_client(
            reqwest::Client::new(),
            Credentials::new("u", "p"),
            "mailto:someone@example.com",
        );
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn decode_keeps_body_on_failure() {
        let err = decode::<serde_json::Value>("<html>").unwrap_err();
        match err {
            Error::Deserialization { body, .. } => assert_eq!(body, "<html>"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn default_config_targets_production() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, HEATZY_API_URL);
        assert_eq!(config.application_id, HEATZY_APPLICATION_ID);
    }
}
