//! Generic REST pipeline.
//!
//! [`RestRequest`] turns a logical API call into a transport-level request and
//! [`RestResponse`] classifies the answer against the per-method status table.

mod request;
mod response;

pub use request::RestRequest;
pub use response::{expected_status, RestResponse};

/// MIME type used for every request and response body
pub const JSON_CONTENT_TYPE: &str = "application/json";
