// Authentication
//
// `POST /login` exchanges username/password for a user token with an
// absolute expiry. The token is cached on the client and reused until
// `expire_at` is reached.

use chrono::Utc;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{HeatzyClient, decode};
use crate::error::Error;
use crate::models::Authentication;

/// Account credentials, fixed for the lifetime of a client.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl HeatzyClient {
    /// Log in with the stored credentials and return the raw login payload.
    ///
    /// Does not touch the token cache; [`get_token`](Self::get_token) does.
    ///
    /// `POST /login` with `{"username", "password"}`
    pub async fn authenticate(&self) -> Result<Authentication, Error> {
        let url = self.endpoint(&["login"]);
        let credentials = self.credentials();
        debug!("POST {}", url);

        let body = json!({
            "username": credentials.username,
            "password": credentials.password.expose_secret(),
        });

        let resp = self.http().post(url).json(&body).send().await?;
        let status = resp.status();

        if status != StatusCode::OK {
            return Err(Error::Authentication {
                status: status.as_u16(),
            });
        }

        // The body carries the token; it is never traced.
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Err(Error::TokenUnavailable);
        }

        let payload: Value = decode(&body)?;
        if !has_usable_token(&payload) {
            return Err(Error::TokenUnavailable);
        }
        let auth: Authentication =
            serde_json::from_value(payload).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: String::new(),
            })?;

        debug!(
            username = %credentials.username,
            expire_at = auth.expire_at,
            "authentication successful"
        );
        Ok(auth)
    }

    /// Return a usable token, logging in first if the cached one is absent
    /// or expired.
    ///
    /// The cache lock is held across the login so that concurrent callers
    /// wait for a single refresh instead of each logging in.
    pub async fn get_token(&self) -> Result<String, Error> {
        let mut cached = self.authentication.lock().await;

        let now = Utc::now().timestamp();
        if let Some(auth) = cached.as_ref().filter(|auth| auth.is_valid_at(now)) {
            return Ok(auth.token.clone());
        }

        debug!("token absent or expired, re-authenticating");
        *cached = None;
        let auth = self.authenticate().await?;
        let token = auth.token.clone();
        *cached = Some(auth);
        Ok(token)
    }
}

/// A login payload is usable only as an object with a non-empty `token`
/// string and an integer `expire_at`.
fn has_usable_token(payload: &Value) -> bool {
    let Some(fields) = payload.as_object() else {
        return false;
    };
    let token = fields.get("token").and_then(Value::as_str);
    token.is_some_and(|t| !t.is_empty()) && fields.get("expire_at").is_some_and(Value::is_i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let credentials = Credentials::new("user@example.com", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("user@example.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn usable_token_requires_object_with_token_and_expiry() {
        assert!(has_usable_token(&json!({ "token": "t", "expire_at": 10 })));
        for payload in [
            json!(null),
            json!([]),
            json!(false),
            json!(""),
            json!(0),
            json!({}),
            json!({ "token": "", "expire_at": 10 }),
            json!({ "token": "t" }),
            json!({ "token": 5, "expire_at": 10 }),
        ] {
            assert!(!has_usable_token(&payload), "accepted {payload}");
        }
    }
}
