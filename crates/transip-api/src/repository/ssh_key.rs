//! SSH key management.

use crate::client::ApiClient;
use crate::models::{
    AddSshKeyRequest, Paging, SshKey, SshKeyWrapper, SshKeysWrapper, UpdateSshKeyRequest,
};
use crate::Result;
use transip_core::query::QueryParams;
use transip_core::RestRequest;

const ENDPOINT: &str = "/ssh-keys";

/// Manage the SSH keys stored on the account under `/ssh-keys`.
#[derive(Clone, Copy)]
pub struct SshKeyRepository<'a> {
    client: &'a ApiClient,
}

impl<'a> SshKeyRepository<'a> {
    /// Repository on top of `client`.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// All SSH keys.
    ///
    /// # Errors
    ///
    /// Returns the client error for a failed call.
    pub async fn get_all(&self) -> Result<Vec<SshKey>> {
        self.list(RestRequest::new(ENDPOINT)).await
    }

    /// One page of SSH keys.
    ///
    /// # Errors
    ///
    /// Returns the client error for a failed call.
    pub async fn get_selection(&self, paging: Paging) -> Result<Vec<SshKey>> {
        let mut params = QueryParams::new();
        params.push_opt("page", (paging.page > 0).then_some(paging.page));
        params.push_opt("pageSize", (paging.page_size > 0).then_some(paging.page_size));
        self.list(RestRequest::new(ENDPOINT).with_params(params))
            .await
    }

    /// A single SSH key.
    ///
    /// # Errors
    ///
    /// Returns an API error with status 404 when the key does not exist.
    pub async fn get_by_id(&self, id: i64) -> Result<SshKey> {
        let wrapper: SshKeyWrapper = self.client.get(&RestRequest::new(item_path(id))).await?;
        Ok(wrapper.ssh_key)
    }

    /// Add a key to the account.
    ///
    /// # Errors
    ///
    /// Returns the client error for a failed call.
    pub async fn add(&self, request: &AddSshKeyRequest) -> Result<()> {
        let request = RestRequest::new(ENDPOINT).with_body(request)?;
        self.client.post(&request).await
    }

    /// Update a key's description and default flag.
    ///
    /// # Errors
    ///
    /// Returns the client error for a failed call.
    pub async fn update(&self, id: i64, request: &UpdateSshKeyRequest) -> Result<()> {
        let request = RestRequest::new(item_path(id)).with_body(request)?;
        self.client.put(&request).await
    }

    /// Remove a key from the account.
    ///
    /// # Errors
    ///
    /// Returns the client error for a failed call.
    pub async fn remove(&self, id: i64) -> Result<()> {
        self.client.delete(&RestRequest::new(item_path(id))).await
    }

    async fn list(&self, request: RestRequest) -> Result<Vec<SshKey>> {
        let wrapper: SshKeysWrapper = self.client.get(&request).await?;
        Ok(wrapper.ssh_keys)
    }
}

fn item_path(id: i64) -> String {
    format!("{ENDPOINT}/{id}")
}
