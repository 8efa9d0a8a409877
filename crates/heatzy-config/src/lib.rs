//! Configuration for applications embedding `heatzy-api`.
//!
//! TOML file + `HEATZY_*` environment variables, password resolution
//! (env, then system keyring, then plaintext), and translation to
//! `heatzy_api::{Credentials, ClientConfig}`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use heatzy_api::{
    ClientConfig, Credentials, HEATZY_API_URL, HEATZY_APPLICATION_ID, TlsMode, TransportConfig,
};

const KEYRING_SERVICE: &str = "heatzy";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured: missing {missing}")]
    NoCredentials { missing: &'static str },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Connection settings and credentials for one Heatzy account.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Account e-mail.
    pub username: Option<String>,

    /// Password (plaintext — prefer keyring or `HEATZY_PASSWORD`).
    pub password: Option<String>,

    /// API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Gizwits application id sent on every request.
    #[serde(default = "default_application_id")]
    pub application_id: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub insecure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            base_url: default_base_url(),
            application_id: default_application_id(),
            timeout: default_timeout(),
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_base_url() -> String {
    HEATZY_API_URL.into()
}
fn default_application_id() -> String {
    HEATZY_APPLICATION_ID.into()
}
fn default_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "heatzy", "heatzy").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("heatzy");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Layered sources: defaults, then the TOML file at `path`, then `HEATZY_*` env vars.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HEATZY_"))
}

/// Load config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    Ok(figment(path).extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve username + password from the config and credential chain.
pub fn resolve_credentials(cfg: &Config) -> Result<Credentials, ConfigError> {
    let username = cfg
        .username
        .clone()
        .ok_or(ConfigError::NoCredentials { missing: "username" })?;

    // 1. Env var
    if let Ok(pw) = std::env::var("HEATZY_PASSWORD") {
        return Ok(Credentials {
            username,
            password: SecretString::from(pw),
        });
    }

    // 2. Keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{username}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(Credentials {
                username,
                password: SecretString::from(pw),
            });
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = cfg.password {
        return Ok(Credentials {
            username,
            password: SecretString::from(pw.clone()),
        });
    }

    Err(ConfigError::NoCredentials { missing: "password" })
}

/// Build the client connection settings from the config.
pub fn client_config(cfg: &Config) -> Result<ClientConfig, ConfigError> {
    url::Url::parse(&cfg.base_url).map_err(|e| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL {}: {e}", cfg.base_url),
    })?;

    if cfg.application_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "application_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let tls = if cfg.insecure {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = cfg.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    Ok(ClientConfig {
        base_url: cfg.base_url.clone(),
        application_id: cfg.application_id.clone(),
        transport: TransportConfig {
            tls,
            timeout: Duration::from_secs(cfg.timeout),
        },
    })
}

/// Everything needed for `HeatzyClient::new`.
pub fn to_client_parts(cfg: &Config) -> Result<(Credentials, ClientConfig), ConfigError> {
    let client = client_config(cfg)?;
    let credentials = resolve_credentials(cfg)?;
    Ok((credentials, client))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn defaults_target_production() {
        Jail::expect_with(|_jail| {
            let cfg: Config = figment(Path::new("absent.toml")).extract()?;
            assert_eq!(cfg.base_url, HEATZY_API_URL);
            assert_eq!(cfg.application_id, HEATZY_APPLICATION_ID);
            assert_eq!(cfg.timeout, 30);
            assert!(cfg.username.is_none());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    username = "file@example.com"
                    timeout = 10
                "#,
            )?;
            jail.set_env("HEATZY_USERNAME", "env@example.com");

            let cfg: Config = figment(Path::new("config.toml")).extract()?;
            assert_eq!(cfg.username.as_deref(), Some("env@example.com"));
            assert_eq!(cfg.timeout, 10);
            Ok(())
        });
    }

    #[test]
    fn password_env_wins_over_plaintext() {
        Jail::expect_with(|jail| {
            jail.set_env("HEATZY_PASSWORD", "from-env");
            let cfg = Config {
                username: Some("user@example.com".into()),
                password: Some("from-file".into()),
                ..Config::default()
            };

            let credentials = resolve_credentials(&cfg).map_err(|e| e.to_string())?;
            assert_eq!(credentials.username, "user@example.com");
            assert_eq!(credentials.password.expose_secret(), "from-env");
            Ok(())
        });
    }

    #[test]
    fn missing_username_is_reported() {
        let err = resolve_credentials(&Config::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { missing: "username" }));
    }

    #[test]
    fn client_config_maps_tls_and_timeout() {
        let cfg = Config {
            ca_cert: Some(PathBuf::from("/etc/ssl/heatzy.pem")),
            timeout: 5,
            ..Config::default()
        };
        let client = client_config(&cfg).unwrap();
        assert!(matches!(client.transport.tls, TlsMode::CustomCa(_)));
        assert_eq!(client.transport.timeout, Duration::from_secs(5));

        let insecure = Config {
            insecure: true,
            ..cfg
        };
        let client = client_config(&insecure).unwrap();
        assert!(matches!(client.transport.tls, TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn client_config_rejects_bad_url() {
        let cfg = Config {
            base_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(
            client_config(&cfg),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn save_then_load_round_trips_file() {
        Jail::expect_with(|_jail| {
            let dir = tempfile::tempdir().map_err(|e| e.to_string())?;
            let path = dir.path().join("nested").join("config.toml");
            let cfg = Config {
                username: Some("user@example.com".into()),
                timeout: 12,
                ..Config::default()
            };
            save_config_to(&cfg, &path).map_err(|e| e.to_string())?;

            let loaded = load_config_from(&path).map_err(|e| e.to_string())?;
            assert_eq!(loaded.username.as_deref(), Some("user@example.com"));
            assert_eq!(loaded.timeout, 12);
            Ok(())
        });
    }
}
