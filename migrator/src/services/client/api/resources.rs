//! Model listing and deletion

use tracing::{debug, info, warn};

use super::{network_error, same_origin, status_error, KEY_HEADER};
use crate::services::client::errors::{ClientError, ClientResult};
use crate::services::client::types::*;
use crate::services::client::versions::{ApiVersionCapability, OperationKind};
use crate::services::client::HttpManagementClient;

/// Upper bound on `nextLink` pages followed in one listing
const MAX_PAGES: usize = 1000;

/// List all models on an instance, following `nextLink` pages
pub async fn list_resources_impl(
    client: &HttpManagementClient,
    instance: &ServiceInstance,
    credential: &Credential,
    version: &ApiVersionCapability,
) -> ClientResult<Vec<ResourceSummary>> {
    let mut url = version.url(&instance.base_url, OperationKind::List, None);
    let mut resources = Vec::new();

    for page in 0..MAX_PAGES {
        debug!("Listing models on {} (page {}): {}", instance, page + 1, url);

        let response = client
            .http_client
            .get(&url)
            .header(KEY_HEADER, credential.api_key())
            .send()
            .await
            .map_err(|e| network_error("list_resources", e))?;

        // Anything but 200 means this version is not served here.
        if response.status().as_u16() != 200 {
            return Err(status_error("list_resources", response).await);
        }

        let listing: ListResourcesResponse =
            response
                .json()
                .await
                .map_err(|e| ClientError::InvalidResponse {
                    expected: "model listing".to_string(),
                    got: e.to_string(),
                })?;

        resources.extend(listing.value);

        match listing.next_link {
            // The key header goes with every page, so never leave the instance.
            Some(next) if !next.is_empty() => {
                if !same_origin(&instance.base_url, &next) {
                    warn!("Refusing nextLink outside {}: {}", instance, next);
                    return Err(ClientError::InvalidResponse {
                        expected: format!("nextLink on {}", instance.base_url),
                        got: next,
                    });
                }
                url = next;
            }
            _ => {
                info!("Listed {} models on {}", resources.len(), instance);
                return Ok(resources);
            }
        }
    }

    warn!(
        "Stopped following nextLink on {} after {} pages",
        instance, MAX_PAGES
    );
    Ok(resources)
}

/// Delete a model by id
pub async fn delete_resource_impl(
    client: &HttpManagementClient,
    destination: &ServiceInstance,
    credential: &Credential,
    version: &ApiVersionCapability,
    resource_id: &str,
) -> ClientResult<()> {
    let url = version.url(&destination.base_url, OperationKind::Delete, Some(resource_id));
    info!("Deleting model {} from {}", resource_id, destination);

    let response = client
        .http_client
        .delete(&url)
        .header(KEY_HEADER, credential.api_key())
        .send()
        .await
        .map_err(|e| network_error("delete_resource", e))?;

    if response.status().is_success() {
        info!("Model {} deleted from {}", resource_id, destination);
        Ok(())
    } else {
        Err(status_error("delete_resource", response).await)
    }
}
