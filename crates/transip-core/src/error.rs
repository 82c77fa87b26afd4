//! Error types for TransIP API operations.
//!
//! This module provides the error taxonomy shared by every layer of the client:
//! configuration, signing, transport, authentication, API and decode failures,
//! plus the `{"error": "<message>"}` body convention used by the API.

use serde::Deserialize;
use thiserror::Error;

/// Main error type for TransIP API operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid or incomplete client configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The private key could not be parsed as an RSA key
    #[error("Failed to parse private key: {0}")]
    KeyParseError(String),

    /// The RSA signing operation failed
    #[error("Failed to sign request: {0}")]
    SigningError(String),

    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Could not connect to the API
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The auth endpoint refused to hand out a token
    #[error("{message}")]
    AuthenticationError {
        /// HTTP status code returned by the auth endpoint
        status: u16,
        /// Message returned by the server
        message: String,
    },

    /// A resource call returned a non-success status with an error body
    #[error("{message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Message returned by the server
        message: String,
    },

    /// A resource call returned a non-success status without a body
    #[error("request failed with status code {status} and no error body")]
    ErrorWithoutBody {
        /// HTTP status code
        status: u16,
    },

    /// A successful response body could not be decoded
    #[error("Failed to decode response: {0}")]
    DecodeError(String),

    /// Token cache could not be read or written
    #[error("Token cache error: {0}")]
    CacheError(String),

    /// Invalid endpoint or URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Token acquisition failed while preparing an API call
    #[error("could not get token from authenticator: {0}")]
    Authenticator(Box<Error>),
}

/// Specialized result type for TransIP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error body returned by the API on failure: `{"error": "<message>"}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Human-readable error message
    pub error: String,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::KeyParseError(_) => "KEY_PARSE_ERROR",
            Self::SigningError(_) => "SIGNING_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::AuthenticationError { .. } => "AUTHENTICATION_ERROR",
            Self::ApiError { .. } => "API_ERROR",
            Self::ErrorWithoutBody { .. } => "ERROR_WITHOUT_BODY",
            Self::DecodeError(_) => "DECODE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::Authenticator(inner) => inner.error_code(),
        }
    }

    /// Returns the HTTP status code carried by this error, if any.
    ///
    /// Lets callers branch on e.g. `404` without matching every variant.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::AuthenticationError { status, .. }
            | Self::ApiError { status, .. }
            | Self::ErrorWithoutBody { status } => Some(*status),
            Self::Authenticator(inner) => inner.status_code(),
            _ => None,
        }
    }

    /// Returns true for network-level failures.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::ServiceUnavailable(_) | Self::Timeout(_) => true,
            Self::Authenticator(inner) => inner.is_transport(),
            _ => false,
        }
    }

    /// Returns true if the API reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Wraps an authenticator failure with call-site context.
    #[must_use]
    pub fn authenticator(inner: Self) -> Self {
        Self::Authenticator(Box::new(inner))
    }

    /// Builds an error from a failed response, decoding `{"error": ..}` when present.
    ///
    /// Bodies that are not in the expected shape are surfaced verbatim as the message.
    #[must_use]
    pub fn from_response_body(status: u16, body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::ErrorWithoutBody { status };
        }

        let message = match serde_json::from_slice::<ErrorBody>(body) {
            Ok(decoded) => decoded.error,
            Err(_) => String::from_utf8_lossy(body).trim().to_string(),
        };

        Self::ApiError { status, message }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::DecodeError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}
