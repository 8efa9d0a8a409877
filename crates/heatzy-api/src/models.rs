// Heatzy API response types
//
// Device payloads are vendor-defined and differ between product lines, so
// they are kept as JSON objects rather than modelled field by field. Only
// the login payload has a contract this crate relies on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Authentication ───────────────────────────────────────────────────

/// Payload returned by `POST /login`.
///
/// `expire_at` is compared as an absolute unix timestamp against the
/// current time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authentication {
    pub token: String,
    pub expire_at: i64,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Authentication {
    /// Whether the token is still usable at unix time `now` (strictly before expiry).
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expire_at > now
    }
}

// ── Devices ──────────────────────────────────────────────────────────

/// A device binding, optionally merged with its latest telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Device(Map<String, Value>);

impl Device {
    /// The Gizwits device id (`did`), if present.
    pub fn did(&self) -> Option<&str> {
        self.0.get("did").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Overlay `telemetry` onto this summary. Telemetry wins on key collision.
    #[must_use]
    pub fn merge(mut self, telemetry: Telemetry) -> Self {
        self.0.extend(telemetry.0);
        self
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Device {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Latest reported state of a device, from `GET /devdata/{id}/latest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Telemetry(Map<String, Value>);

impl Telemetry {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Telemetry {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Body of `GET /bindings`. A missing or null `devices` means no bindings.
#[derive(Debug, Deserialize)]
pub(crate) struct Bindings {
    #[serde(default)]
    pub devices: Option<Vec<Device>>,
}
