use reqwest::StatusCode;
use thiserror::Error;

/// Top-level error type for the `heatzy-api` crate.
///
/// Every endpoint has its own variant carrying the HTTP status the backend
/// answered with, plus the device id for per-device endpoints. Nothing is
/// retried internally; callers decide using [`Error::is_transient`] and
/// friends.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// `/login` answered with a non-200 status.
    #[error("Authentication failed (HTTP {status})")]
    Authentication { status: u16 },

    /// `/login` succeeded but the payload carried no usable token.
    #[error("Authentication succeeded but no token was returned")]
    TokenUnavailable,

    // ── Devices ─────────────────────────────────────────────────────
    /// `/bindings` answered with a non-200 status.
    #[error("Devices not retrieved (HTTP {status})")]
    DeviceList { status: u16 },

    /// `/devices/{id}` answered with a non-200 status.
    #[error("Device {device_id} not retrieved (HTTP {status})")]
    DeviceFetch { status: u16, device_id: String },

    /// `/devdata/{id}/latest` answered with a non-200 status.
    #[error("Device data for {device_id} not retrieved (HTTP {status})")]
    DeviceData { status: u16, device_id: String },

    /// `/control/{id}` answered with a non-200 status.
    #[error("Control of device {device_id} failed (HTTP {status})")]
    Control { status: u16, device_id: String },

    /// A device summary without a `did` field cannot be merged with telemetry.
    #[error("Device summary has no `did` field")]
    MissingDeviceId,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header value (application id, token) contains bytes HTTP forbids.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The HTTP status attached to this error, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status }
            | Self::DeviceList { status }
            | Self::DeviceFetch { status, .. }
            | Self::DeviceData { status, .. }
            | Self::Control { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The device id this error refers to, for per-device endpoints.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::DeviceFetch { device_id, .. }
            | Self::DeviceData { device_id, .. }
            | Self::Control { device_id, .. } => Some(device_id.as_str()),
            _ => None,
        }
    }

    /// Returns `true` if the credentials or token were rejected.
    pub fn is_auth_expired(&self) -> bool {
        if matches!(self, Self::TokenUnavailable) {
            return true;
        }
        matches!(
            self.status().map(StatusCode::from_u16),
            Some(Ok(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN))
        )
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => self.status().is_some_and(|s| (500..600).contains(&s)),
        }
    }
}
