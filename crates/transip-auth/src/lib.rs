//! Authentication for the TransIP REST API.
//!
//! Provides RSA request signing, bearer token handling with expiry detection,
//! token caches, and the [`Authenticator`] that ties them together: it hands out
//! the current token while it is valid and requests a new, signed one when it
//! is not.

#![deny(missing_docs)]

pub mod authenticator;
pub mod cache;
pub mod request;
pub mod signer;
pub mod token;

#[cfg(test)]
mod test_keys;

pub use authenticator::{Authenticator, AUTH_ENDPOINT, LABEL_PREFIX, SIGNATURE_HEADER};
pub use cache::{CacheItem, FileTokenCache, InMemoryTokenCache, TokenCache};
pub use request::{AuthRequest, ExpirationTime};
pub use signer::sign;
pub use token::Token;

/// Convenient result alias that reuses the core error type.
pub type Result<T> = transip_core::Result<T>;
