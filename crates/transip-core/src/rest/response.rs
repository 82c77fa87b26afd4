//! Response parser.

use crate::error::{Error, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// The only status code that counts as success for `method`.
///
/// GET answers 200, POST answers 201 (created), and PUT, PATCH and DELETE
/// answer 204 without a body.
#[must_use]
pub fn expected_status(method: &Method) -> StatusCode {
    match *method {
        Method::POST => StatusCode::CREATED,
        Method::PUT | Method::PATCH | Method::DELETE => StatusCode::NO_CONTENT,
        _ => StatusCode::OK,
    }
}

/// A received response: method used, status code and raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    method: Method,
    status: StatusCode,
    body: Vec<u8>,
}

impl RestResponse {
    /// Wrap a response that has already been read.
    #[must_use]
    pub fn new(method: Method, status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method,
            status,
            body: body.into(),
        }
    }

    /// Read the full body of a [`reqwest::Response`].
    ///
    /// # Errors
    ///
    /// Returns a transport error if the body cannot be read.
    pub async fn from_reqwest(method: Method, response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let body = response.bytes().await?;
        Ok(Self::new(method, status, body.to_vec()))
    }

    /// Method the request was sent with.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Status code received.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns true if the status matches the method's entry in the success table.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == expected_status(&self.method)
    }

    fn has_body(&self) -> bool {
        !self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Convert a failed response into its error, or succeed without decoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ApiError`] or [`Error::ErrorWithoutBody`] when the status
    /// is not the expected one for the method.
    pub fn into_result(self) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }

        debug!(
            method = %self.method,
            status = self.status.as_u16(),
            "API call returned unexpected status"
        );
        Err(Error::from_response_body(self.status.as_u16(), &self.body))
    }

    /// Decode a successful body into `T`.
    ///
    /// Returns `Ok(None)` for a successful response without a body.
    ///
    /// # Errors
    ///
    /// Returns an API error on an unexpected status, or a decode error when the
    /// body is not valid JSON for `T`.
    pub fn parse_into<T>(&self) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        if !self.is_success() {
            return Err(Error::from_response_body(
                self.status.as_u16(),
                &self.body,
            ));
        }

        if !self.has_body() {
            return Ok(None);
        }

        serde_json::from_slice(&self.body)
            .map(Some)
            .map_err(|err| Error::DecodeError(format!("Failed to decode response body: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ping {
        ping: String,
    }

    #[test]
    fn success_table() {
        assert_eq!(expected_status(&Method::GET), StatusCode::OK);
        assert_eq!(expected_status(&Method::POST), StatusCode::CREATED);
        assert_eq!(expected_status(&Method::PUT), StatusCode::NO_CONTENT);
        assert_eq!(expected_status(&Method::PATCH), StatusCode::NO_CONTENT);
        assert_eq!(expected_status(&Method::DELETE), StatusCode::NO_CONTENT);
    }

    #[test]
    fn only_the_table_entry_is_success() {
        assert!(RestResponse::new(Method::POST, StatusCode::CREATED, "").is_success());
        assert!(!RestResponse::new(Method::POST, StatusCode::OK, "").is_success());
        assert!(!RestResponse::new(Method::GET, StatusCode::NO_CONTENT, "").is_success());
        assert!(RestResponse::new(Method::DELETE, StatusCode::NO_CONTENT, "").is_success());
        assert!(!RestResponse::new(Method::DELETE, StatusCode::OK, "").is_success());
    }

    #[test]
    fn parse_into_decodes_success_body() {
        let response = RestResponse::new(Method::GET, StatusCode::OK, r#"{"ping":"pong"}"#);
        let ping: Option<Ping> = response.parse_into().unwrap();
        assert_eq!(
            ping,
            Some(Ping {
                ping: "pong".to_string()
            })
        );
    }

    #[test]
    fn parse_into_empty_success_body_is_none() {
        let response = RestResponse::new(Method::PATCH, StatusCode::NO_CONTENT, "");
        let parsed: Option<Ping> = response.parse_into().unwrap();
        assert!(parsed.is_none());
        assert!(response.into_result().is_ok());
    }

    #[test]
    fn parse_into_malformed_body_is_decode_error() {
        let response = RestResponse::new(Method::GET, StatusCode::OK, "{not json");
        let err = response.parse_into::<Ping>().unwrap_err();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    #[test]
    fn failure_with_error_body() {
        let response = RestResponse::new(
            Method::GET,
            StatusCode::NOT_FOUND,
            r#"{"error":"SSH key with id '12' not found"}"#,
        );
        let err = response.parse_into::<Ping>().unwrap_err();
        assert_eq!(
            err,
            Error::ApiError {
                status: 404,
                message: "SSH key with id '12' not found".to_string()
            }
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn failure_without_body() {
        let response = RestResponse::new(Method::DELETE, StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(
            response.into_result().unwrap_err(),
            Error::ErrorWithoutBody { status: 500 }
        );
    }

    #[test]
    fn unexpected_success_code_is_failure() {
        let response = RestResponse::new(
            Method::POST,
            StatusCode::OK,
            r#"{"error":"unexpected"}"#,
        );
        let err = response.into_result().unwrap_err();
        assert_eq!(err.status_code(), Some(200));
        assert_eq!(err.to_string(), "unexpected");
    }

    #[tokio::test]
    async fn from_reqwest_reads_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ping": "pong"})))
            .mount(&server)
            .await;

        let response = reqwest::get(format!("{}/api-test", server.uri()))
            .await
            .unwrap();
        let parsed = RestResponse::from_reqwest(Method::GET, response)
            .await
            .unwrap();

        assert_eq!(parsed.status(), StatusCode::OK);
        assert!(parsed.is_success());
        let ping: Ping = parsed.parse_into().unwrap().unwrap();
        assert_eq!(ping.ping, "pong");
    }
}
