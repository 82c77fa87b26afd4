//! Authenticated client and resource repositories for the TransIP REST API.
//!
//! [`ApiClient`] obtains tokens through a [`transip_auth::Authenticator`],
//! sends JSON requests and checks each response against the status code its
//! method is expected to return. Repositories such as [`SshKeyRepository`] wrap
//! individual resources on top of it.

#![deny(missing_docs)]

pub mod client;
pub mod models;
pub mod repository;

pub use client::{ApiClient, ApiClientBuilder};
pub use models::{
    AddSshKeyRequest, AvailabilityZone, Paging, PingResponse, SshKey, UpdateSshKeyRequest,
};
pub use repository::{AvailabilityZoneRepository, SshKeyRepository, TestRepository};
pub use transip_core::{ClientConfiguration, Error};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = transip_core::Result<T>;
