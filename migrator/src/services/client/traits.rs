//! Collaborator interface the migration engine drives

use async_trait::async_trait;

use super::context::ActiveContext;
use super::errors::ClientResult;
use super::types::{
    Credential, OperationHandle, OperationStatus, ResourceSummary, ServiceInstance,
    TransferAuthorization,
};
use super::versions::ApiVersionCapability;

/// Management-plane operations on a service instance.
///
/// Every call names the context it is issued under; implementations reject
/// calls whose context does not own the target instance.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// List models; only a 200 response is `Ok`
    async fn list_resources(
        &self,
        ctx: &ActiveContext,
        instance: &ServiceInstance,
        credential: &Credential,
        version: &ApiVersionCapability,
    ) -> ClientResult<Vec<ResourceSummary>>;

    async fn authorize_copy(
        &self,
        ctx: &ActiveContext,
        destination: &ServiceInstance,
        credential: &Credential,
        version: &ApiVersionCapability,
        resource_id: &str,
        description: &str,
    ) -> ClientResult<TransferAuthorization>;

    async fn delete_resource(
        &self,
        ctx: &ActiveContext,
        destination: &ServiceInstance,
        credential: &Credential,
        version: &ApiVersionCapability,
        resource_id: &str,
    ) -> ClientResult<()>;

    async fn initiate_copy(
        &self,
        ctx: &ActiveContext,
        source: &ServiceInstance,
        credential: &Credential,
        version: &ApiVersionCapability,
        resource_id: &str,
        authorization: &TransferAuthorization,
    ) -> ClientResult<OperationHandle>;

    async fn poll_operation(
        &self,
        ctx: &ActiveContext,
        source: &ServiceInstance,
        credential: &Credential,
        handle: &OperationHandle,
    ) -> ClientResult<OperationStatus>;
}
