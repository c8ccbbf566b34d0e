use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

use super::context::ActiveContext;
use super::errors::{ClientError, ClientResult};
use super::traits::ManagementApi;
use super::types::*;
use super::versions::ApiVersionCapability;
use crate::services::config::HttpConfig;

/// HTTPS client for the provider's management API
#[derive(Clone)]
pub struct HttpManagementClient {
    pub(crate) http_client: Client,
}

impl HttpManagementClient {
    pub fn new(config: &HttpConfig) -> ClientResult<Self> {
        let http_client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl ManagementApi for HttpManagementClient {
    #[instrument(skip(self, credential, version), fields(version = %version.version), err)]
    async fn list_resources(
        &self,
        ctx: &ActiveContext,
        instance: &ServiceInstance,
        credential: &Credential,
        version: &ApiVersionCapability,
    ) -> ClientResult<Vec<ResourceSummary>> {
        ctx.ensure_covers(instance, "list_resources")?;
        super::api::list_resources_impl(self, instance, credential, version).await
    }

    #[instrument(skip(self, credential, version), fields(version = %version.version), err)]
    async fn authorize_copy(
        &self,
        ctx: &ActiveContext,
        destination: &ServiceInstance,
        credential: &Credential,
        version: &ApiVersionCapability,
        resource_id: &str,
        description: &str,
    ) -> ClientResult<TransferAuthorization> {
        ctx.ensure_covers(destination, "authorize_copy")?;
        super::api::authorize_copy_impl(
            self,
            destination,
            credential,
            version,
            resource_id,
            description,
        )
        .await
    }

    #[instrument(skip(self, credential, version), fields(version = %version.version), err)]
    async fn delete_resource(
        &self,
        ctx: &ActiveContext,
        destination: &ServiceInstance,
        credential: &Credential,
        version: &ApiVersionCapability,
        resource_id: &str,
    ) -> ClientResult<()> {
        ctx.ensure_covers(destination, "delete_resource")?;
        super::api::delete_resource_impl(self, destination, credential, version, resource_id).await
    }

    #[instrument(
        skip(self, credential, version, authorization),
        fields(version = %version.version),
        err
    )]
    async fn initiate_copy(
        &self,
        ctx: &ActiveContext,
        source: &ServiceInstance,
        credential: &Credential,
        version: &ApiVersionCapability,
        resource_id: &str,
        authorization: &TransferAuthorization,
    ) -> ClientResult<OperationHandle> {
        ctx.ensure_covers(source, "initiate_copy")?;
        super::api::initiate_copy_impl(
            self,
            source,
            credential,
            version,
            resource_id,
            authorization,
        )
        .await
    }

    #[instrument(skip(self, credential), err)]
    async fn poll_operation(
        &self,
        ctx: &ActiveContext,
        source: &ServiceInstance,
        credential: &Credential,
        handle: &OperationHandle,
    ) -> ClientResult<OperationStatus> {
        ctx.ensure_covers(source, "poll_operation")?;
        super::api::poll_operation_impl(self, credential, handle).await
    }
}
