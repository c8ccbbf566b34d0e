//! Authorizing: obtain a copy authorization from the destination
//!
//! A 409 means a model with this id probably survived an earlier attempt at the
//! destination. With the operator's consent that model is deleted and the
//! authorization requested once more.

use tracing::{error, info, warn};

use crate::migration::confirm::Confirmation;
use crate::migration::progress::{MigrationEvent, ProgressContext};
use crate::migration::types::{ResourceDescriptor, TransferPhase};
use crate::services::client::{
    ActiveContext, ApiVersionCapability, Credential, ManagementApi, ServiceInstance,
    TransferAuthorization,
};
use crate::services::errors::{MigrationError, MigrationResult};

#[allow(clippy::too_many_arguments)]
pub async fn authorize_with_recovery<A: ManagementApi + ?Sized>(
    api: &A,
    confirmation: &dyn Confirmation,
    progress: &mut ProgressContext<'_>,
    ctx: &ActiveContext,
    destination: &ServiceInstance,
    credential: &Credential,
    version: &ApiVersionCapability,
    resource: &ResourceDescriptor,
) -> MigrationResult<TransferAuthorization> {
    let resource_id = resource.resource_id();

    let conflict = match api
        .authorize_copy(
            ctx,
            destination,
            credential,
            version,
            resource_id,
            resource.description(),
        )
        .await
    {
        Ok(authorization) => {
            info!("Copy of {} authorized by {}", resource_id, destination);
            return Ok(authorization);
        }
        Err(e) if e.is_conflict() => e,
        Err(e) => {
            return Err(MigrationError::TransferRequest {
                phase: TransferPhase::Authorizing,
                resource_id: resource_id.to_string(),
                source: e,
            })
        }
    };

    warn!(
        "Authorization for {} conflicted at {}: {}",
        resource_id, destination, conflict
    );

    let prompt = format!(
        "Model '{}' may already exist at {} from an earlier, incomplete migration. \
         Delete the destination model and retry? Whatever is stored under that id at \
         the destination will be permanently removed.",
        resource_id, destination
    );
    let accepted = confirmation.confirm(&prompt).await;
    progress.emit(MigrationEvent::ConflictRecovery {
        resource_id: resource_id.to_string(),
        accepted,
    });

    if !accepted {
        return Err(MigrationError::AuthorizationConflict {
            resource_id: resource_id.to_string(),
            message: "recovery declined by operator".to_string(),
            detail: conflict.provider_detail().map(str::to_string),
        });
    }

    api.delete_resource(ctx, destination, credential, version, resource_id)
        .await
        .map_err(|e| {
            error!("Could not delete orphaned {} at {}: {}", resource_id, destination, e);
            MigrationError::AuthorizationConflict {
                resource_id: resource_id.to_string(),
                message: format!("deleting the orphaned destination model failed: {}", e),
                detail: e.provider_detail().map(str::to_string),
            }
        })?;

    info!("Retrying copy authorization for {}", resource_id);
    api.authorize_copy(
        ctx,
        destination,
        credential,
        version,
        resource_id,
        resource.description(),
    )
    .await
    .map_err(|e| MigrationError::TransferRequest {
        phase: TransferPhase::Authorizing,
        resource_id: resource_id.to_string(),
        source: e,
    })
}
