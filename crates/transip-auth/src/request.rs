//! Token request payload sent to the auth endpoint.

use chrono::Utc;
use serde::{Serialize, Serializer};
use std::time::Duration;
use uuid::Uuid;

/// Requested token lifetime, sent as `"<n> seconds"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationTime(pub Duration);

impl Serialize for ExpirationTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{} seconds", self.0.as_secs()))
    }
}

/// Body of `POST /auth`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthRequest {
    /// Account login name
    pub login: String,
    /// Random value; the server rejects reused nonces
    pub nonce: String,
    /// Label shown next to the token in the control panel
    pub label: String,
    /// Request a read-only token
    pub read_only: bool,
    /// Requested lifetime
    pub expiration_time: ExpirationTime,
    /// Token usable from any IP address instead of whitelisted ones only
    pub global_key: bool,
}

impl AuthRequest {
    /// Build a request with a fresh nonce and a timestamped label.
    #[must_use]
    pub fn new(
        login: impl Into<String>,
        label_prefix: &str,
        read_only: bool,
        global_key: bool,
        expiration: Duration,
    ) -> Self {
        Self {
            login: login.into(),
            nonce: new_nonce(),
            label: format!("{label_prefix}-{}", Utc::now().timestamp()),
            read_only,
            expiration_time: ExpirationTime(expiration),
            global_key,
        }
    }
}

/// 32 hexadecimal characters.
fn new_nonce() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_wire_fields() {
        let mut request = AuthRequest::new(
            "example-user",
            "transip-rs",
            true,
            false,
            Duration::from_secs(86_400),
        );
        request.nonce = "0123456789abcdef0123456789abcdef".to_string();
        request.label = "transip-rs-1700000000".to_string();

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "login": "example-user",
                "nonce": "0123456789abcdef0123456789abcdef",
                "label": "transip-rs-1700000000",
                "read_only": true,
                "expiration_time": "86400 seconds",
                "global_key": false
            })
        );
    }

    #[test]
    fn nonce_is_fresh_per_request() {
        let first = AuthRequest::new("a", "p", false, true, Duration::from_secs(60));
        let second = AuthRequest::new("a", "p", false, true, Duration::from_secs(60));
        assert_ne!(first.nonce, second.nonce);
        assert_eq!(first.nonce.len(), 32);
        assert!(first.nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn label_carries_prefix() {
        let request = AuthRequest::new("a", "transip-rs", false, true, Duration::from_secs(60));
        assert!(request.label.starts_with("transip-rs-"));
    }
}
