//! CopyInitiating: hand the destination's authorization to the source

use tracing::info;

use crate::migration::types::{ResourceDescriptor, TransferPhase};
use crate::services::client::{
    ActiveContext, ApiVersionCapability, ClientError, ManagementApi, OperationHandle,
    TransferAuthorization,
};
use crate::services::errors::{MigrationError, MigrationResult};

/// Start the copy at the source.
///
/// Runs with the resource's own source credential and the destination's best
/// version. The authorization is consumed; it only ever backs one copy.
pub async fn initiate_copy<A: ManagementApi + ?Sized>(
    api: &A,
    ctx: &ActiveContext,
    version: &ApiVersionCapability,
    resource: &ResourceDescriptor,
    authorization: TransferAuthorization,
) -> MigrationResult<OperationHandle> {
    let resource_id = resource.resource_id();
    let failed = |source: ClientError| MigrationError::TransferRequest {
        phase: TransferPhase::CopyInitiating,
        resource_id: resource_id.to_string(),
        source,
    };

    if authorization.resource_id != resource_id {
        return Err(failed(ClientError::InvalidResponse {
            expected: format!("authorization for {}", resource_id),
            got: format!("authorization for {}", authorization.resource_id),
        }));
    }

    let credential = resource
        .credential()
        .ok_or_else(|| MigrationError::AuthResolution {
            instance: resource.instance().to_string(),
            message: format!("no credential attached to {}", resource_id),
        })?;

    let handle = api
        .initiate_copy(
            ctx,
            resource.instance(),
            credential,
            version,
            resource_id,
            &authorization,
        )
        .await
        .map_err(failed)?;

    info!("Copy of {} started: {}", resource_id, handle.url);
    Ok(handle)
}
