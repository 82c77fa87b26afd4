//! Bearer tokens and expiry detection.
//!
//! Tokens handed out by the auth endpoint are JWTs. Only the payload segment is
//! read, to learn the `exp` claim; the signature is left for the server to
//! verify. Anything that does not decode that way is a static token that never
//! expires.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;

const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

/// A bearer token with its optional expiry (Unix seconds).
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    raw: String,
    expiry: Option<i64>,
}

impl Token {
    /// Wrap a raw token string, reading its expiry when it is a JWT.
    #[must_use]
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let expiry = decode_expiry(&raw);
        Self { raw, expiry }
    }

    /// Wrap a raw token string with an explicit expiry.
    #[must_use]
    pub fn with_expiry(raw: impl Into<String>, expiry: Option<i64>) -> Self {
        Self {
            raw: raw.into(),
            expiry,
        }
    }

    /// Raw token string.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Expiry as a Unix timestamp, if the token carries one.
    #[must_use]
    pub const fn expiry_timestamp(&self) -> Option<i64> {
        self.expiry
    }

    /// Expiry as a date, if the token carries one.
    #[must_use]
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }

    /// Returns true once the expiry has passed. Tokens without expiry never expire.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expired_at(Utc::now())
    }

    /// Expiry check against a given instant.
    #[must_use]
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| expiry < now.timestamp())
    }

    /// `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.raw)
    }

    /// Returns true for an empty token string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("raw", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .finish()
    }
}

fn decode_expiry(raw: &str) -> Option<i64> {
    let mut segments = raw.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let bytes = BASE64_URL.decode(payload).ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()?.exp
}

#[cfg(test)]
pub(crate) fn jwt_with_claims(claims: &serde_json::Value) -> String {
    let header = BASE64_URL.encode(br#"{"typ":"JWT","alg":"RS512"}"#);
    let payload = BASE64_URL.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

#[cfg(test)]
pub(crate) fn jwt_expiring_in(seconds: i64) -> String {
    jwt_with_claims(&serde_json::json!({
        "iss": "api.transip.nl",
        "aud": "api.transip.nl",
        "jti": "0123456789abcdef",
        "iat": Utc::now().timestamp(),
        "exp": Utc::now().timestamp() + seconds,
    }))
}
