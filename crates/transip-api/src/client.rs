//! Authenticated API client.

use crate::repository::{AvailabilityZoneRepository, SshKeyRepository, TestRepository};
use crate::Result;
use reqwest::header::{HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use transip_auth::{Authenticator, Token, TokenCache};
use transip_core::client::HttpConfig;
use transip_core::{ClientConfiguration, Error, RestRequest, RestResponse};
use url::Url;

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfiguration,
    http_config: HttpConfig,
    http: Option<Client>,
    cache: Option<Arc<dyn TokenCache>>,
}

impl ApiClientBuilder {
    /// Create a builder from a client configuration.
    #[must_use]
    pub fn new(config: ClientConfiguration) -> Self {
        let http_config = HttpConfig::new().with_timeout(config.timeout());
        Self {
            config,
            http_config,
            http: None,
            cache: None,
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: HttpConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Use an existing HTTP client instead of building one.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Keep tokens in `cache` instead of the configured cache file.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid settings or credentials, and a
    /// cache error when the configured cache file cannot be opened.
    pub fn build(self) -> Result<ApiClient> {
        let http = match self.http {
            Some(client) => client,
            None => self.http_config.build_client()?,
        };

        let user_agent = HeaderValue::from_str(&self.http_config.user_agent)
            .map_err(|err| Error::ConfigError(format!("Invalid user agent: {err}")))?;

        let mut authenticator = Authenticator::from_config(&self.config, http.clone())?
            .with_user_agent(user_agent.clone());
        if let Some(cache) = self.cache {
            authenticator = authenticator.with_cache(cache);
        }

        Ok(ApiClient {
            http,
            base_url: self.config.parse_url()?,
            user_agent,
            test_mode: self.config.test_mode,
            authenticator: Arc::new(authenticator),
        })
    }
}

/// Client that attaches a valid bearer token to every call and parses
/// responses against the per-method success status.
///
/// Cloning is cheap; clones share the HTTP connection pool and the
/// authenticator, so a token renewed through one clone is seen by all of them.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    user_agent: HeaderValue,
    test_mode: bool,
    authenticator: Arc<Authenticator>,
}

impl ApiClient {
    /// Construct a client directly from a configuration.
    ///
    /// # Errors
    ///
    /// See [`ApiClientBuilder::build`].
    pub fn new(config: ClientConfiguration) -> Result<Self> {
        ApiClientBuilder::new(config).build()
    }

    /// Start building a client.
    #[must_use]
    pub fn builder(config: ClientConfiguration) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether calls are sent in test mode.
    #[must_use]
    pub const fn test_mode(&self) -> bool {
        self.test_mode
    }

    /// The authenticator handing out tokens for this client.
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// API test endpoint.
    #[must_use]
    pub fn test(&self) -> TestRepository<'_> {
        TestRepository::new(self)
    }

    /// Availability zones.
    #[must_use]
    pub fn availability_zones(&self) -> AvailabilityZoneRepository<'_> {
        AvailabilityZoneRepository::new(self)
    }

    /// SSH keys.
    #[must_use]
    pub fn ssh_keys(&self) -> SshKeyRepository<'_> {
        SshKeyRepository::new(self)
    }

    /// `GET` and decode the response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authenticator`] when no token could be obtained, the
    /// API error for a non-200 status, and a decode error for an empty or
    /// malformed body.
    pub async fn get<T>(&self, request: &RestRequest) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.execute(Method::GET, request).await?;
        require_body(response.parse_into::<T>()?)
    }

    /// `POST`, expecting `201 Created`.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn post(&self, request: &RestRequest) -> Result<()> {
        self.execute(Method::POST, request).await?.into_result()
    }

    /// `POST`, expecting `201 Created` with a body to decode.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn post_with_response<T>(&self, request: &RestRequest) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.execute(Method::POST, request).await?;
        require_body(response.parse_into::<T>()?)
    }

    /// `PUT`, expecting `204 No Content`.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn put(&self, request: &RestRequest) -> Result<()> {
        self.execute(Method::PUT, request).await?.into_result()
    }

    /// `PATCH`, expecting `204 No Content`.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn patch(&self, request: &RestRequest) -> Result<()> {
        self.execute(Method::PATCH, request).await?.into_result()
    }

    /// `DELETE`, expecting `204 No Content`.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub async fn delete(&self, request: &RestRequest) -> Result<()> {
        self.execute(Method::DELETE, request).await?.into_result()
    }

    /// `DELETE` with a JSON body, expecting `204 No Content`.
    ///
    /// # Errors
    ///
    /// Returns a decode error when `body` cannot be serialized; otherwise see
    /// [`get`](Self::get).
    pub async fn delete_with_body<B>(&self, request: &RestRequest, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let request = request.clone().with_body(body)?;
        self.delete(&request).await
    }

    async fn execute(&self, method: Method, request: &RestRequest) -> Result<RestResponse> {
        let token = self
            .authenticator
            .get_token()
            .await
            .map_err(Error::authenticator)?;

        let mut request = request.clone();
        if self.test_mode {
            request.params_mut().push("test", 1);
        }

        let mut built = request.build(&self.http, &self.base_url, method.clone())?;
        let headers = built.headers_mut();
        headers.insert(AUTHORIZATION, bearer(&token)?);
        headers.insert(USER_AGENT, self.user_agent.clone());

        debug!(
            method = %method,
            endpoint = request.endpoint(),
            test_mode = self.test_mode,
            "sending API request"
        );

        let response = self.http.execute(built).await?;
        let response = RestResponse::from_reqwest(method, response).await?;

        debug!(status = response.status().as_u16(), "received API response");
        Ok(response)
    }
}

fn bearer(token: &Token) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&token.header_value()).map_err(|_| {
        Error::authenticator(Error::ConfigError(
            "token contains characters that are not valid in a header".to_string(),
        ))
    })?;
    value.set_sensitive(true);
    Ok(value)
}

fn require_body<T>(parsed: Option<T>) -> Result<T> {
    parsed.ok_or_else(|| Error::DecodeError("expected a response body, got none".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> ClientConfiguration {
        ClientConfiguration::demo("static-test-token").with_url(format!("{}/v6", server.uri()))
    }

    fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new(config(server)).unwrap()
    }

    #[tokio::test]
    async fn get_sends_bearer_token_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/products"))
            .and(header("Authorization", "Bearer static-test-token"))
            .and(header("Accept", "application/json"))
            .and(header("User-Agent", transip_core::client::USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let body: Value = client.get(&RestRequest::new("/products")).await.unwrap();
        assert_eq!(body, json!({ "products": [] }));
    }

    #[tokio::test]
    async fn get_with_empty_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/products"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .get::<Value>(&RestRequest::new("/products"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    #[tokio::test]
    async fn test_mode_appends_query_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v6/ssh-keys/7"))
            .and(query_param("test", "1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(config(&server).with_test_mode(true)).unwrap();
        assert!(client.test_mode());
        client
            .delete(&RestRequest::new("/ssh-keys/7"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn status_outside_success_table_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v6/ssh-keys"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .post(&RestRequest::new("/ssh-keys"))
            .await
            .unwrap_err();
        assert_eq!(err, Error::ErrorWithoutBody { status: 200 });
    }

    #[tokio::test]
    async fn api_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v6/vps/example-vps"))
            .respond_with(
                ResponseTemplate::new(406)
                    .set_body_json(json!({ "error": "This action is not allowed" })),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .patch(&RestRequest::new("/vps/example-vps"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "This action is not allowed");
        assert_eq!(err.status_code(), Some(406));
    }

    #[tokio::test]
    async fn put_sends_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v6/ssh-keys/7"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({ "description": "laptop" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let request = RestRequest::new("/ssh-keys/7")
            .with_body(&json!({ "description": "laptop" }))
            .unwrap();
        client.put(&request).await.unwrap();
    }

    #[tokio::test]
    async fn delete_with_body_attaches_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v6/vps/example-vps"))
            .and(body_json(json!({ "endTime": "immediately" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .delete_with_body(
                &RestRequest::new("/vps/example-vps"),
                &json!({ "endTime": "immediately" }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn post_with_response_decodes_created_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v6/actions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 42 })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let body: Value = client
            .post_with_response(&RestRequest::new("/actions"))
            .await
            .unwrap();
        assert_eq!(body["id"], 42);
    }

    #[tokio::test]
    async fn token_failure_is_wrapped_and_nothing_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/products"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        // expired static token ({"exp":1}) and no key to renew it with
        let expired = "e30.eyJleHAiOjF9.c2ln";
        let client = ApiClient::new(
            ClientConfiguration::new("example-user")
                .unwrap()
                .with_url(format!("{}/v6", server.uri()))
                .with_token(expired),
        )
        .unwrap();

        let err = client
            .get::<Value>(&RestRequest::new("/products"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Authenticator(_)));
        assert!(err
            .to_string()
            .starts_with("could not get token from authenticator: "));
    }

    #[test]
    fn build_rejects_missing_credentials() {
        let config = ClientConfiguration::new("example-user").unwrap();
        assert!(matches!(
            ApiClient::new(config).err(),
            Some(Error::ConfigError(_))
        ));
    }
}
