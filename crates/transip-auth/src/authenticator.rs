//! Token acquisition and expiry-based renewal.

use crate::cache::{FileTokenCache, TokenCache};
use crate::request::AuthRequest;
use crate::signer;
use crate::token::Token;
use crate::Result;
use reqwest::header::{HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use transip_core::client::USER_AGENT as DEFAULT_USER_AGENT;
use transip_core::config::DEFAULT_TOKEN_EXPIRATION_SECS;
use transip_core::{ClientConfiguration, Error, RestRequest};
use url::Url;

/// Path of the token endpoint, relative to the API base URL
pub const AUTH_ENDPOINT: &str = "/auth";

/// Header carrying the base64 RSA signature of the request body
pub const SIGNATURE_HEADER: &str = "signature";

/// Prefix of token labels and cache keys
pub const LABEL_PREFIX: &str = "transip-rs";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Hands out bearer tokens, requesting a new signed one when the current one
/// has expired.
///
/// Every successful [`request_new_token`](Self::request_new_token) consumes one
/// of the account's API tokens, so [`get_token`](Self::get_token) reuses the
/// current token (and the cache, when configured) for as long as it is valid.
pub struct Authenticator {
    http: Client,
    base_url: Url,
    login: String,
    private_key: Option<SecretString>,
    read_only: bool,
    global_key: bool,
    expiration: Duration,
    label_prefix: String,
    user_agent: HeaderValue,
    cache: Option<Arc<dyn TokenCache>>,
    token: Mutex<Option<Token>>,
}

impl Authenticator {
    /// Create an authenticator for `login` against the API at `base_url`.
    #[must_use]
    pub fn new(login: impl Into<String>, base_url: Url, http: Client) -> Self {
        Self {
            http,
            base_url,
            login: login.into(),
            private_key: None,
            read_only: false,
            global_key: true,
            expiration: Duration::from_secs(DEFAULT_TOKEN_EXPIRATION_SECS),
            label_prefix: LABEL_PREFIX.to_string(),
            user_agent: HeaderValue::from_static(DEFAULT_USER_AGENT),
            cache: None,
            token: Mutex::new(None),
        }
    }

    /// Build an authenticator from a client configuration.
    ///
    /// Reads the private key file and opens the token cache file when those are
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid credentials, an unreadable key
    /// file or a bad URL, and a cache error when the cache file cannot be opened.
    pub fn from_config(config: &ClientConfiguration, http: Client) -> Result<Self> {
        config.validate_credentials()?;
        let base_url = config.parse_url()?;

        let mut authenticator = Self::new(config.account_name.clone(), base_url, http)
            .with_read_only(config.read_only)
            .with_global_key(!config.whitelisted_only)
            .with_expiration(config.token_expiration());

        if let Some(key) = &config.private_key {
            authenticator.private_key = Some(key.clone());
        } else if let Some(path) = &config.private_key_path {
            let pem = std::fs::read_to_string(path).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read private key {}: {err}",
                    path.display()
                ))
            })?;
            authenticator = authenticator.with_private_key(pem);
        }

        if let Some(token) = &config.token {
            authenticator = authenticator.with_token(Token::parse(token.expose_secret()));
        }

        if let Some(path) = &config.token_cache_path {
            let cache = FileTokenCache::open(path)?;
            authenticator = authenticator.with_cache(Arc::new(cache));
        }

        Ok(authenticator)
    }

    /// Use a PEM-encoded RSA private key to sign token requests.
    #[must_use]
    pub fn with_private_key(mut self, pem: impl Into<String>) -> Self {
        self.private_key = Some(SecretString::from(pem.into()));
        self
    }

    /// Start from an existing token.
    #[must_use]
    pub fn with_token(self, token: Token) -> Self {
        Self {
            token: Mutex::new(Some(token)),
            ..self
        }
    }

    /// Keep tokens in `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Request read-only tokens.
    #[must_use]
    pub const fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Request tokens usable from any IP (`true`) or whitelisted IPs only (`false`).
    #[must_use]
    pub const fn with_global_key(mut self, global_key: bool) -> Self {
        self.global_key = global_key;
        self
    }

    /// Requested lifetime of new tokens.
    #[must_use]
    pub const fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    /// Prefix for token labels and cache keys.
    #[must_use]
    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    /// `User-Agent` sent with token requests.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: HeaderValue) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Account login name.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Key under which tokens are cached; read-only and read-write tokens are
    /// kept apart.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let mode = if self.read_only {
            "read-only"
        } else {
            "read-write"
        };
        format!("{}-{}-{mode}-token", self.label_prefix, self.login)
    }

    /// Current valid token, renewing it when it has expired.
    ///
    /// Renewal happens inline on the calling task and is serialized, so
    /// concurrent callers share one new token. On failure the stored token is
    /// left as it was.
    ///
    /// # Errors
    ///
    /// Propagates configuration, signing, transport, authentication, decode and
    /// cache errors. Nothing is retried.
    pub async fn get_token(&self) -> Result<Token> {
        let mut current = self.token.lock().await;

        if let Some(token) = current.as_ref().filter(|token| !token.expired()) {
            return Ok(token.clone());
        }

        if let Some(token) = self.cached_token()? {
            debug!(login = %self.login, "using cached token");
            *current = Some(token.clone());
            return Ok(token);
        }

        let token = self.request_new_token().await?;
        self.store_in_cache(&token);
        *current = Some(token.clone());
        Ok(token)
    }

    /// Sign and send a token request.
    ///
    /// The returned token is not stored; [`get_token`](Self::get_token) does that.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no private key is available, a key
    /// parse or signing error for an unusable key, a transport error for network
    /// failures, [`Error::AuthenticationError`] with the server message for a
    /// non-success status, and a decode error for an unreadable success body.
    pub async fn request_new_token(&self) -> Result<Token> {
        let private_key = self.private_key.as_ref().ok_or_else(|| {
            Error::ConfigError("no private key available to request a new token".to_string())
        })?;

        let auth_request = AuthRequest::new(
            self.login.as_str(),
            &self.label_prefix,
            self.read_only,
            self.global_key,
            self.expiration,
        );

        let mut request = RestRequest::new(AUTH_ENDPOINT)
            .with_body(&auth_request)?
            .build(&self.http, &self.base_url, Method::POST)?;

        let signature = {
            let payload = request
                .body()
                .and_then(reqwest::Body::as_bytes)
                .unwrap_or_default();
            signer::sign(payload, private_key.expose_secret())?
        };
        let signature = HeaderValue::from_str(&signature)
            .map_err(|err| Error::SigningError(format!("invalid signature header: {err}")))?;
        let headers = request.headers_mut();
        headers.insert(HeaderName::from_static(SIGNATURE_HEADER), signature);
        headers.insert(USER_AGENT, self.user_agent.clone());

        info!(
            login = %self.login,
            label = %auth_request.label,
            read_only = self.read_only,
            global_key = self.global_key,
            "requesting new API token"
        );

        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(login = %self.login, status = status.as_u16(), "token request rejected");
            return Err(authentication_error(status.as_u16(), &body));
        }

        let decoded: TokenResponse = serde_json::from_slice(&body)
            .map_err(|err| Error::DecodeError(format!("Failed to decode token response: {err}")))?;
        if decoded.token.is_empty() {
            return Err(Error::DecodeError(
                "token response did not contain a token".to_string(),
            ));
        }

        let token = Token::parse(decoded.token);
        info!(login = %self.login, expiry = ?token.expiry(), "obtained new API token");
        Ok(token)
    }

    fn cached_token(&self) -> Result<Option<Token>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };

        let data = cache.get(&self.cache_key())?;
        if data.is_empty() {
            return Ok(None);
        }

        let Ok(raw) = String::from_utf8(data) else {
            warn!(key = %self.cache_key(), "ignoring cached token that is not valid UTF-8");
            return Ok(None);
        };

        let token = Token::parse(raw);
        Ok((!token.is_empty() && !token.expired()).then_some(token))
    }

    fn store_in_cache(&self, token: &Token) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.set(&self.cache_key(), token.raw().as_bytes()) {
                warn!(error = %err, "failed to cache new API token");
            }
        }
    }
}

fn authentication_error(status: u16, body: &[u8]) -> Error {
    match Error::from_response_body(status, body) {
        Error::ApiError { status, message } => Error::AuthenticationError { status, message },
        _ => Error::AuthenticationError {
            status,
            message: format!("authentication failed with status code {status}"),
        },
    }
}
