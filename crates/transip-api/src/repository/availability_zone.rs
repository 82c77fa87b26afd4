//! Availability zone lookups.

use crate::client::ApiClient;
use crate::models::{AvailabilityZone, AvailabilityZonesWrapper};
use crate::Result;
use transip_core::RestRequest;

/// Read access to `/availability-zones`.
#[derive(Clone, Copy)]
pub struct AvailabilityZoneRepository<'a> {
    client: &'a ApiClient,
}

impl<'a> AvailabilityZoneRepository<'a> {
    /// Repository on top of `client`.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// All availability zones.
    ///
    /// # Errors
    ///
    /// Returns the client error for a failed call.
    pub async fn get_all(&self) -> Result<Vec<AvailabilityZone>> {
        let wrapper: AvailabilityZonesWrapper = self
            .client
            .get(&RestRequest::new("/availability-zones"))
            .await?;
        Ok(wrapper.availability_zones)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_all_unwraps_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/availability-zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "availabilityZones": [
                    { "name": "ams0", "country": "nl", "isDefault": true }
                ]
            })))
            .mount(&server)
            .await;

        let zones = client(&server).availability_zones().get_all().await.unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].name, "ams0");
        assert!(zones[0].is_default);
    }
}
