//! Cross-instance copy operations
//!
//! The destination issues an authorization, the source receives it verbatim
//! and starts the copy, and the returned operation URL is polled until done.

use reqwest::header::CONTENT_TYPE;
use tracing::{error, info};

use super::{network_error, status_error, KEY_HEADER, OPERATION_LOCATION};
use crate::services::client::errors::{ClientError, ClientResult};
use crate::services::client::types::*;
use crate::services::client::versions::{ApiVersionCapability, OperationKind};
use crate::services::client::HttpManagementClient;

/// Ask the destination for a copy authorization
pub async fn authorize_copy_impl(
    client: &HttpManagementClient,
    destination: &ServiceInstance,
    credential: &Credential,
    version: &ApiVersionCapability,
    resource_id: &str,
    description: &str,
) -> ClientResult<TransferAuthorization> {
    let url = version.url(&destination.base_url, OperationKind::Authorize, None);
    info!("Requesting copy authorization for {} from {}", resource_id, destination);

    let response = client
        .http_client
        .post(&url)
        .header(KEY_HEADER, credential.api_key())
        .json(&AuthorizeCopyRequest {
            resource_id,
            description,
        })
        .send()
        .await
        .map_err(|e| network_error("authorize_copy", e))?;

    if !response.status().is_success() {
        let err = status_error("authorize_copy", response).await;
        error!("Copy authorization for {} failed: {}", resource_id, err);
        return Err(err);
    }

    let payload = response
        .bytes()
        .await
        .map_err(|e| network_error("authorize_copy", e))?;

    validate_authorization(&payload)?;

    Ok(TransferAuthorization {
        resource_id: resource_id.to_string(),
        payload,
    })
}

/// Start the copy on the source, forwarding the authorization bytes unchanged
pub async fn initiate_copy_impl(
    client: &HttpManagementClient,
    source: &ServiceInstance,
    credential: &Credential,
    version: &ApiVersionCapability,
    resource_id: &str,
    authorization: &TransferAuthorization,
) -> ClientResult<OperationHandle> {
    let url = version.url(&source.base_url, OperationKind::Copy, Some(resource_id));
    info!("Starting copy of {} on {}", resource_id, source);

    let response = client
        .http_client
        .post(&url)
        .header(KEY_HEADER, credential.api_key())
        .header(CONTENT_TYPE, "application/json")
        .body(authorization.payload.clone())
        .send()
        .await
        .map_err(|e| network_error("initiate_copy", e))?;

    if !response.status().is_success() {
        let err = status_error("initiate_copy", response).await;
        error!("Copy of {} could not be started: {}", resource_id, err);
        return Err(err);
    }

    let location = response
        .headers()
        .get(OPERATION_LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    operation_handle(location)
}

/// Fetch the current status of a copy operation
pub async fn poll_operation_impl(
    client: &HttpManagementClient,
    credential: &Credential,
    handle: &OperationHandle,
) -> ClientResult<OperationStatus> {
    let response = client
        .http_client
        .get(&handle.url)
        .header(KEY_HEADER, credential.api_key())
        .send()
        .await
        .map_err(|e| network_error("poll_operation", e))?;

    if !response.status().is_success() {
        return Err(status_error("poll_operation", response).await);
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::InvalidResponse {
            expected: "operation status".to_string(),
            got: e.to_string(),
        })
}

/// The authorization is opaque but must at least be a JSON document
fn validate_authorization(payload: &[u8]) -> ClientResult<()> {
    serde_json::from_slice::<serde::de::IgnoredAny>(payload)
        .map(|_| ())
        .map_err(|e| ClientError::InvalidResponse {
            expected: "JSON copy authorization".to_string(),
            got: e.to_string(),
        })
}

fn operation_handle(location: Option<String>) -> ClientResult<OperationHandle> {
    match location {
        Some(url) if !url.trim().is_empty() => Ok(OperationHandle { url }),
        _ => Err(ClientError::InvalidResponse {
            expected: format!("{} header", OPERATION_LOCATION),
            got: "no operation URL".to_string(),
        }),
    }
}
