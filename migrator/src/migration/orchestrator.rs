//! Batch orchestration
//!
//! Runs the transfer state machine for each model in input order against a
//! destination probed once up front. A failed model never stops the batch;
//! only preflight failures (access, credentials, probe) do.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::migration::cancel::CancellationSignal;
use crate::migration::confirm::{AutoConfirm, Confirmation};
use crate::migration::probe::{probe_best, ProbeReport};
use crate::migration::progress::{
    LoggingEventHandler, MigrationEvent, MigrationEventHandler, ProgressContext,
};
use crate::migration::transfer::{TransferEnv, TransferStateMachine};
use crate::migration::types::{
    BatchReport, FailureRecord, ResourceDescriptor, ResourceOutcome, ResourceReport,
    TransferPhase,
};
use crate::services::client::{
    default_catalog, ActiveContext, ApiVersion, ApiVersionCapability, ContextSwitcher,
    Credential, CredentialResolver, ManagementApi, ServiceInstance, VersionCatalog,
};
use crate::services::config::MigrationConfig;
use crate::services::errors::{MigrationError, MigrationResult};

/// One batch position: a model still to migrate, or an id already known to fail
#[derive(Debug, Clone)]
pub enum InventoryEntry {
    Pending(ResourceDescriptor),
    Rejected(ResourceReport),
}

impl InventoryEntry {
    pub fn resource_id(&self) -> &str {
        match self {
            InventoryEntry::Pending(resource) => resource.resource_id(),
            InventoryEntry::Rejected(report) => &report.resource_id,
        }
    }
}

/// Models found at the source, in batch order
#[derive(Debug, Default)]
pub struct SourceInventory {
    pub entries: Vec<InventoryEntry>,
}

impl SourceInventory {
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, InventoryEntry::Pending(_)))
            .count()
    }

    pub fn rejected(&self) -> usize {
        self.entries.len() - self.pending()
    }
}

pub struct BatchOrchestrator {
    api: Arc<dyn ManagementApi>,
    credentials: Arc<dyn CredentialResolver>,
    switcher: Arc<dyn ContextSwitcher>,
    catalog: VersionCatalog,
    config: MigrationConfig,
    confirmation: Arc<dyn Confirmation>,
    events: Arc<dyn MigrationEventHandler>,
    cancel: CancellationSignal,
}

impl BatchOrchestrator {
    /// Orchestrator over the default catalog that declines conflict recovery
    /// and logs progress.
    pub fn new(
        api: Arc<dyn ManagementApi>,
        credentials: Arc<dyn CredentialResolver>,
        switcher: Arc<dyn ContextSwitcher>,
    ) -> Self {
        Self {
            api,
            credentials,
            switcher,
            catalog: default_catalog().clone(),
            config: MigrationConfig::default(),
            confirmation: Arc::new(AutoConfirm::decline()),
            events: Arc::new(LoggingEventHandler),
            cancel: CancellationSignal::new(),
        }
    }

    pub fn with_catalog(mut self, catalog: VersionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_config(mut self, config: MigrationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_confirmation(mut self, confirmation: Arc<dyn Confirmation>) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn with_event_handler(mut self, events: Arc<dyn MigrationEventHandler>) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that cancels runs of this orchestrator
    pub fn cancellation(&self) -> CancellationSignal {
        self.cancel.clone()
    }

    /// Probe a single instance and return its diagnostics
    pub async fn probe(&self, instance: &ServiceInstance) -> MigrationResult<ProbeReport> {
        self.switcher.verify_access(&instance.domain)?;
        let credential = self.credentials.resolve(instance).await?;
        self.probe_with(instance, &credential).await
    }

    async fn probe_with(
        &self,
        instance: &ServiceInstance,
        credential: &Credential,
    ) -> MigrationResult<ProbeReport> {
        let ctx = self.switcher.activate_for(instance)?;
        probe_best(
            self.api.as_ref(),
            &ctx,
            instance,
            credential,
            &self.catalog,
            &self.config.probe,
        )
        .await
    }

    /// List migratable models at `source` under `version`.
    ///
    /// Built-in models are excluded. With a non-empty `filter` only those ids
    /// are returned, in filter order with repeats dropped; ids that cannot be
    /// migrated stay in place as `Rejected` entries instead of vanishing.
    pub async fn enumerate_resources(
        &self,
        ctx: &ActiveContext,
        source: &Arc<ServiceInstance>,
        credential: &Credential,
        version: &ApiVersionCapability,
        filter: &[String],
    ) -> MigrationResult<SourceInventory> {
        let listed = self
            .api
            .list_resources(ctx, source, credential, version)
            .await
            .map_err(|e| MigrationError::Enumeration {
                instance: source.to_string(),
                source: e,
            })?;

        let probe = &self.config.probe;
        let mut by_id: HashMap<&str, _> = HashMap::new();
        let mut order = Vec::new();
        for summary in &listed {
            if probe.is_system_resource(&summary.resource_id) {
                continue;
            }
            if by_id.insert(summary.resource_id.as_str(), summary).is_none() {
                order.push(summary.resource_id.as_str());
            }
        }

        let wanted: Vec<&str> = if filter.is_empty() {
            order
        } else {
            let mut seen = HashSet::new();
            filter
                .iter()
                .map(String::as_str)
                .filter(|id| {
                    let first = seen.insert(*id);
                    if !first {
                        warn!("{} requested more than once, migrating it once", id);
                    }
                    first
                })
                .collect()
        };

        let mut inventory = SourceInventory::default();
        for id in wanted {
            let Some(summary) = by_id.get(id) else {
                let reason = if probe.is_system_resource(id) {
                    "built-in model, not migratable"
                } else {
                    "not found at source"
                };
                warn!("{}: {}", id, reason);
                inventory.entries.push(rejected(id, source, reason));
                continue;
            };

            // Models without a recorded version were created under the listing version.
            let source_version = match summary.api_version.as_deref() {
                Some(raw) => match ApiVersion::parse(raw) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        inventory.entries.push(rejected(id, source, &e.to_string()));
                        continue;
                    }
                },
                None => version.version.clone(),
            };

            inventory
                .entries
                .push(InventoryEntry::Pending(ResourceDescriptor::new(
                    id,
                    summary.description.clone().unwrap_or_default(),
                    source_version,
                    Arc::clone(source),
                )));
        }

        info!(
            "{} models to migrate from {} ({} rejected)",
            inventory.pending(),
            source,
            inventory.rejected()
        );
        Ok(inventory)
    }

    /// Migrate models from `source` to `destination`; an empty `filter`
    /// selects every non-system model.
    #[instrument(skip_all, fields(source = %source, destination = %destination), err)]
    pub async fn migrate(
        &self,
        source: &ServiceInstance,
        destination: &ServiceInstance,
        filter: &[String],
    ) -> MigrationResult<BatchReport> {
        let source = Arc::new(source.clone());
        let credentials = self.preflight(&[source.as_ref(), destination]).await?;
        let source_credential = credential_for(&credentials, &source)?;

        let source_probe = self.probe_with(&source, source_credential).await?;
        let ctx = self.switcher.activate_for(&source)?;
        let inventory = self
            .enumerate_resources(&ctx, &source, source_credential, &source_probe.best, filter)
            .await?;

        self.execute(inventory.entries, destination, &credentials)
            .await
    }

    /// Migrate already-described models to `destination`
    #[instrument(skip_all, fields(destination = %destination, count = resources.len()), err)]
    pub async fn run(
        &self,
        resources: Vec<ResourceDescriptor>,
        destination: &ServiceInstance,
    ) -> MigrationResult<BatchReport> {
        let mut instances: Vec<&ServiceInstance> = vec![destination];
        for resource in &resources {
            if !instances.contains(&resource.instance()) {
                instances.push(resource.instance());
            }
        }
        let credentials = self.preflight(&instances).await?;

        let entries = resources.into_iter().map(InventoryEntry::Pending).collect();
        self.execute(entries, destination, &credentials).await
    }

    /// Probe the destination and drive every entry in order.
    ///
    /// `credentials` must hold the destination and every pending model's source.
    async fn execute(
        &self,
        mut entries: Vec<InventoryEntry>,
        destination: &ServiceInstance,
        credentials: &HashMap<String, Credential>,
    ) -> MigrationResult<BatchReport> {
        for entry in &mut entries {
            if let InventoryEntry::Pending(resource) = entry {
                let credential = credential_for(credentials, resource.instance())?.clone();
                resource.attach_credential(credential);
            }
        }

        let destination_credential = credential_for(credentials, destination)?;
        let destination_probe = self.probe_with(destination, destination_credential).await?;
        let destination_best = destination_probe.best;

        let total = entries.len();
        let mut progress = ProgressContext::new(total, self.events.as_ref());
        progress.emit(MigrationEvent::BatchStarted {
            total,
            destination: destination.to_string(),
            destination_version: destination_best.version.to_string(),
        });

        let env = TransferEnv {
            api: self.api.as_ref(),
            switcher: self.switcher.as_ref(),
            confirmation: self.confirmation.as_ref(),
            destination,
            destination_credential,
            destination_best: &destination_best,
            poll: &self.config.poll,
            cancel: &self.cancel,
        };

        let mut reports = Vec::with_capacity(total);
        for (index, entry) in entries.iter().enumerate() {
            let resource = match entry {
                InventoryEntry::Pending(resource) => resource,
                InventoryEntry::Rejected(report) => {
                    progress.resource_finished(&report.resource_id, &report.outcome);
                    reports.push(report.clone());
                    continue;
                }
            };
            let resource_id = resource.resource_id();

            let outcome = if self.cancel.is_cancelled() {
                ResourceOutcome::Failed(FailureRecord {
                    resource_id: resource_id.to_string(),
                    instance: resource.instance().to_string(),
                    phase: TransferPhase::VersionCheck,
                    error: "cancelled".to_string(),
                    provider_detail: None,
                })
            } else {
                progress.resource_started(index, resource_id);
                TransferStateMachine::new(&env, resource)
                    .run(&mut progress)
                    .await
            };

            progress.resource_finished(resource_id, &outcome);
            reports.push(ResourceReport {
                resource_id: resource_id.to_string(),
                instance: resource.instance().to_string(),
                outcome,
            });
        }

        let report = BatchReport {
            destination: destination.to_string(),
            destination_version: destination_best.version.clone(),
            diagnostics: destination_probe.diagnostics,
            resources: reports,
        };

        progress.emit(MigrationEvent::BatchCompleted {
            completed: report.completed(),
            skipped: report.skipped(),
            failed: report.failed(),
        });
        Ok(report)
    }

    /// Verify every domain, then resolve every credential. Any failure is fatal.
    async fn preflight(
        &self,
        instances: &[&ServiceInstance],
    ) -> MigrationResult<HashMap<String, Credential>> {
        for instance in instances {
            self.switcher.verify_access(&instance.domain)?;
        }

        let mut credentials = HashMap::new();
        for instance in instances {
            let key = instance.id();
            if !credentials.contains_key(&key) {
                let credential = self.credentials.resolve(instance).await?;
                credentials.insert(key, credential);
            }
        }
        Ok(credentials)
    }
}

fn credential_for<'c>(
    credentials: &'c HashMap<String, Credential>,
    instance: &ServiceInstance,
) -> MigrationResult<&'c Credential> {
    credentials
        .get(&instance.id())
        .ok_or_else(|| MigrationError::AuthResolution {
            instance: instance.to_string(),
            message: "credential was not resolved during preflight".to_string(),
        })
}

fn rejected(resource_id: &str, source: &ServiceInstance, reason: &str) -> InventoryEntry {
    InventoryEntry::Rejected(ResourceReport {
        resource_id: resource_id.to_string(),
        instance: source.to_string(),
        outcome: ResourceOutcome::Failed(FailureRecord {
            resource_id: resource_id.to_string(),
            instance: source.to_string(),
            phase: TransferPhase::VersionCheck,
            error: reason.to_string(),
            provider_detail: None,
        }),
    })
}
