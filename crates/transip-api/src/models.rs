//! Resource models and their response wrappers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Response of `GET /api-test`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PingResponse {
    /// `"pong"` when the API is reachable and the token is accepted
    pub ping: String,
}

/// A data center location that resources can be placed in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityZone {
    /// Zone name, e.g. `ams0`
    pub name: String,
    /// ISO country code of the zone
    pub country: String,
    /// New resources are placed here unless another zone is requested
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AvailabilityZonesWrapper {
    pub availability_zones: Vec<AvailabilityZone>,
}

/// An SSH public key stored on the account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SshKey {
    /// Key identifier
    pub id: i64,
    /// Public key in OpenSSH format
    pub key: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Creation time, in the API's local time
    #[serde(default, with = "api_datetime")]
    pub creation_date: Option<NaiveDateTime>,
    /// Key fingerprint
    #[serde(default)]
    pub fingerprint: String,
    /// Key is installed on new VPSes by default
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SshKeysWrapper {
    pub ssh_keys: Vec<SshKey>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SshKeyWrapper {
    pub ssh_key: SshKey,
}

/// Request body for adding an SSH key.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddSshKeyRequest {
    /// Public key in OpenSSH format
    pub ssh_key: String,
    /// Free-form description
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Install the key on new VPSes by default
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
}

impl AddSshKeyRequest {
    /// Request for `key` with a description.
    #[must_use]
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            ssh_key: key.into(),
            description: description.into(),
            is_default: false,
        }
    }
}

/// Request body for updating an SSH key.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSshKeyRequest {
    /// New description
    pub description: String,
    /// Install the key on new VPSes by default
    pub is_default: bool,
}

/// Page selection for list calls. A zero page or page size is not sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paging {
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub page_size: u32,
}

impl Paging {
    /// Select `page` with `page_size` items per page.
    #[must_use]
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }
}

/// `YYYY-MM-DD HH:MM:SS` timestamps; empty strings and nulls are `None`.
mod api_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&value.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.is_empty() => NaiveDateTime::parse_from_str(&raw, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
