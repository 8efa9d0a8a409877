// heatzy-api: Async Rust client for the Heatzy (Gizwits) cloud API

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::{ClientConfig, HEATZY_API_URL, HEATZY_APPLICATION_ID, HeatzyClient};
pub use error::Error;
pub use models::{Authentication, Device, Telemetry};
pub use transport::{TlsMode, TransportConfig};
