//! Resource repositories.
//!
//! Each repository borrows an [`ApiClient`](crate::ApiClient) and maps one
//! resource's endpoints onto typed calls.

mod availability_zone;
mod ssh_key;

pub use api_test::TestRepository;
pub use availability_zone::AvailabilityZoneRepository;
pub use ssh_key::SshKeyRepository;
