//! Request builder.

use super::JSON_CONTENT_TYPE;
use crate::error::{Error, Result};
use crate::query::QueryParams;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// A logical API call: endpoint path, query parameters and an optional JSON body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestRequest {
    endpoint: String,
    params: QueryParams,
    body: Option<Value>,
}

impl RestRequest {
    /// Create a request for an endpoint path such as `/ssh-keys`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: QueryParams::new(),
            body: None,
        }
    }

    /// Attach query parameters.
    #[must_use]
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Attach a body, serialized to JSON.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the body cannot be represented as JSON.
    pub fn with_body<T>(mut self, body: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Endpoint path.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query parameters.
    #[must_use]
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Mutable access to the query parameters.
    pub fn params_mut(&mut self) -> &mut QueryParams {
        &mut self.params
    }

    /// Body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Serialized body bytes. A request without a body sends nothing rather
    /// than a JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns a decode error if serialization fails.
    pub fn body_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(Error::from)
    }

    /// Full URL: the base URL (path preserved) followed by the endpoint and query.
    ///
    /// # Errors
    ///
    /// Returns an invalid endpoint error if the combination is not a valid URL.
    pub fn url(&self, base: &Url) -> Result<Url> {
        let endpoint = self.endpoint.trim_start_matches('/');
        let joined = format!("{}/{endpoint}", base.as_str().trim_end_matches('/'));
        let mut url = Url::parse(&joined).map_err(|err| {
            Error::InvalidEndpoint(format!("Invalid endpoint `{}`: {err}", self.endpoint))
        })?;

        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params.iter());
        }

        Ok(url)
    }

    /// Start a [`RequestBuilder`] with URL, JSON headers and body set.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or body cannot be produced.
    pub fn request_builder(
        &self,
        http: &Client,
        base: &Url,
        method: Method,
    ) -> Result<RequestBuilder> {
        let url = self.url(base)?;
        let mut builder = http
            .request(method, url)
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE);

        if let Some(bytes) = self.body_bytes()? {
            builder = builder.body(bytes);
        }

        Ok(builder)
    }

    /// Build a complete transport-level request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL, body or request cannot be produced.
    pub fn build(&self, http: &Client, base: &Url, method: Method) -> Result<reqwest::Request> {
        self.request_builder(http, base, method)?
            .build()
            .map_err(Error::from)
    }
}
