//! Test doubles shared by the engine's unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::migration::progress::{MigrationEvent, MigrationEventHandler};
use crate::migration::types::ResourceDescriptor;
use crate::services::client::{
    ActiveContext, ApiVersion, ApiVersionCapability, ClientError, ClientResult, Credential,
    KeySource, ManagementApi, OperationHandle, OperationStatus, ResourceSummary,
    ServiceInstance, StaticCredentialResolver, TransferAuthorization, VersionCatalog,
};

pub fn instance(name: &str, domain: &str) -> ServiceInstance {
    ServiceInstance {
        domain: domain.to_string(),
        subaccount: "sub".to_string(),
        resource_group: "rg".to_string(),
        account_name: name.to_string(),
        base_url: format!("https://{}.example.com", name),
    }
}

pub fn catalog(versions: &[&str]) -> VersionCatalog {
    VersionCatalog::new(
        versions
            .iter()
            .map(|v| ApiVersionCapability::new(ApiVersion::parse(v).unwrap(), "/documentModels"))
            .collect(),
    )
}

pub fn descriptor(id: &str, version: &str, owner: &ServiceInstance) -> ResourceDescriptor {
    ResourceDescriptor::new(
        id,
        format!("{} model", id),
        ApiVersion::parse(version).unwrap(),
        Arc::new(owner.clone()),
    )
}

/// Inline `<account>-key` credentials for each instance
pub fn resolver(instances: &[&ServiceInstance]) -> StaticCredentialResolver {
    instances
        .iter()
        .fold(StaticCredentialResolver::new(), |resolver, instance| {
            resolver.with_key(
                instance,
                KeySource::Inline(format!("{}-key", instance.account_name)),
            )
        })
}

fn http_status(operation: &str, status: u16, detail: Option<&str>) -> ClientError {
    ClientError::HttpStatus {
        operation: operation.to_string(),
        status,
        detail: detail.map(str::to_string),
    }
}

enum ListScript {
    Ok(Vec<String>),
    Status(u16),
    Unreachable,
}

#[derive(Default)]
struct Script {
    lists: HashMap<String, ListScript>,
    authorize: VecDeque<ClientResult<()>>,
    delete: VecDeque<ClientResult<()>>,
    copy: VecDeque<ClientResult<()>>,
    poll: VecDeque<ClientResult<OperationStatus>>,
    counts: HashMap<&'static str, usize>,
    contexts: Vec<(String, String)>,
    authorize_keys: Vec<String>,
    copy_keys: Vec<String>,
    copy_bodies: Vec<Bytes>,
}

/// In-memory `ManagementApi` that answers from scripted queues and records
/// every call.
///
/// Listings are scripted per API version and default to 404. Authorize,
/// delete and copy succeed and polls report 100% once their queues run dry.
#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<Script>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        f(&mut self.script.lock().unwrap())
    }

    pub fn list_ok(&self, version: &str, ids: &[&str]) {
        let ids = ids.iter().map(|id| id.to_string()).collect();
        self.with(|s| s.lists.insert(version.to_string(), ListScript::Ok(ids)));
    }

    pub fn list_status(&self, version: &str, status: u16) {
        self.with(|s| s.lists.insert(version.to_string(), ListScript::Status(status)));
    }

    pub fn list_unreachable(&self, version: &str) {
        self.with(|s| s.lists.insert(version.to_string(), ListScript::Unreachable));
    }

    pub fn authorize_status(&self, status: u16) {
        self.with(|s| {
            s.authorize
                .push_back(Err(http_status("authorize_copy", status, None)))
        });
    }

    pub fn delete_status(&self, status: u16) {
        self.with(|s| {
            s.delete
                .push_back(Err(http_status("delete_resource", status, None)))
        });
    }

    pub fn copy_error(&self, status: u16, detail: &str) {
        self.with(|s| {
            s.copy
                .push_back(Err(http_status("initiate_copy", status, Some(detail))))
        });
    }

    pub fn poll_percent(&self, status: &str, percent: Option<u32>) {
        let status = OperationStatus {
            status: status.to_string(),
            percent_completed: percent,
            error: None,
        };
        self.with(|s| s.poll.push_back(Ok(status)));
    }

    pub fn poll_status(&self, status: u16) {
        self.with(|s| {
            s.poll
                .push_back(Err(http_status("poll_operation", status, None)))
        });
    }

    fn calls(&self, operation: &str) -> usize {
        self.with(|s| s.counts.get(operation).copied().unwrap_or(0))
    }

    pub fn list_calls(&self) -> usize {
        self.calls("list_resources")
    }

    pub fn authorize_calls(&self) -> usize {
        self.calls("authorize_copy")
    }

    pub fn delete_calls(&self) -> usize {
        self.calls("delete_resource")
    }

    pub fn copy_calls(&self) -> usize {
        self.calls("initiate_copy")
    }

    pub fn poll_calls(&self) -> usize {
        self.calls("poll_operation")
    }

    /// (operation, active context) for every call, in order
    pub fn contexts(&self) -> Vec<(String, String)> {
        self.with(|s| s.contexts.clone())
    }

    pub fn authorize_keys(&self) -> Vec<String> {
        self.with(|s| s.authorize_keys.clone())
    }

    pub fn copy_keys(&self) -> Vec<String> {
        self.with(|s| s.copy_keys.clone())
    }

    pub fn copy_bodies(&self) -> Vec<Bytes> {
        self.with(|s| s.copy_bodies.clone())
    }

    fn record(
        &self,
        operation: &'static str,
        ctx: &ActiveContext,
        instance: &ServiceInstance,
    ) -> ClientResult<()> {
        self.with(|s| {
            *s.counts.entry(operation).or_default() += 1;
            s.contexts.push((operation.to_string(), ctx.to_string()));
        });
        ctx.ensure_covers(instance, operation)
    }
}

#[async_trait]
impl ManagementApi for ScriptedApi {
    async fn list_resources(
        &self,
        ctx: &ActiveContext,
        instance: &ServiceInstance,
        _credential: &Credential,
        version: &ApiVersionCapability,
    ) -> ClientResult<Vec<ResourceSummary>> {
        self.record("list_resources", ctx, instance)?;
        self.with(|s| match s.lists.get(version.version.as_str()) {
            Some(ListScript::Ok(ids)) => Ok(ids
                .iter()
                .map(|id| ResourceSummary {
                    resource_id: id.clone(),
                    description: Some(format!("{} model", id)),
                    api_version: None,
                    created_date_time: None,
                })
                .collect()),
            Some(ListScript::Status(status)) => Err(http_status("list_resources", *status, None)),
            Some(ListScript::Unreachable) => Err(ClientError::NetworkError {
                operation: "list_resources".to_string(),
                message: "connection refused".to_string(),
            }),
            None => Err(http_status("list_resources", 404, None)),
        })
    }

    async fn authorize_copy(
        &self,
        ctx: &ActiveContext,
        destination: &ServiceInstance,
        credential: &Credential,
        _version: &ApiVersionCapability,
        resource_id: &str,
        _description: &str,
    ) -> ClientResult<TransferAuthorization> {
        self.record("authorize_copy", ctx, destination)?;
        let attempt = self.calls("authorize_copy");
        self.with(|s| {
            s.authorize_keys.push(credential.api_key().to_string());
            s.authorize.pop_front().unwrap_or(Ok(()))
        })?;
        Ok(TransferAuthorization {
            resource_id: resource_id.to_string(),
            payload: Bytes::from(format!(
                r#"{{"targetModelId":"{}","accessToken":"token-{}"}}"#,
                resource_id, attempt
            )),
        })
    }

    async fn delete_resource(
        &self,
        ctx: &ActiveContext,
        destination: &ServiceInstance,
        _credential: &Credential,
        _version: &ApiVersionCapability,
        _resource_id: &str,
    ) -> ClientResult<()> {
        self.record("delete_resource", ctx, destination)?;
        self.with(|s| s.delete.pop_front().unwrap_or(Ok(())))
    }

    async fn initiate_copy(
        &self,
        ctx: &ActiveContext,
        source: &ServiceInstance,
        credential: &Credential,
        _version: &ApiVersionCapability,
        resource_id: &str,
        authorization: &TransferAuthorization,
    ) -> ClientResult<OperationHandle> {
        self.record("initiate_copy", ctx, source)?;
        self.with(|s| {
            s.copy_keys.push(credential.api_key().to_string());
            s.copy_bodies.push(authorization.payload.clone());
            s.copy.pop_front().unwrap_or(Ok(()))
        })?;
        Ok(OperationHandle {
            url: format!("{}/operations/{}", source.base_url, resource_id),
        })
    }

    async fn poll_operation(
        &self,
        ctx: &ActiveContext,
        source: &ServiceInstance,
        _credential: &Credential,
        _handle: &OperationHandle,
    ) -> ClientResult<OperationStatus> {
        self.record("poll_operation", ctx, source)?;
        self.with(|s| {
            s.poll.pop_front().unwrap_or_else(|| {
                Ok(OperationStatus {
                    status: "succeeded".to_string(),
                    percent_completed: Some(100),
                    error: None,
                })
            })
        })
    }
}

/// Event handler that keeps everything it hears
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<MigrationEvent>>,
}

impl RecordingEvents {
    pub fn events(&self) -> Vec<MigrationEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, event: &MigrationEvent) -> bool {
        self.events.lock().unwrap().contains(event)
    }
}

impl MigrationEventHandler for RecordingEvents {
    fn handle_event(&self, event: &MigrationEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
