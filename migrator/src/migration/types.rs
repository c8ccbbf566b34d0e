//! Migration data model: descriptors, per-resource states and batch reports

use std::fmt;
use std::sync::Arc;

use crate::migration::probe::CapabilityProbeResult;
use crate::services::client::{ApiVersion, Credential, ServiceInstance};
use crate::services::errors::MigrationError;

/// One migratable model at the source
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    resource_id: String,
    description: String,
    source_version: ApiVersion,
    instance: Arc<ServiceInstance>,
    credential: Option<Credential>,
}

impl ResourceDescriptor {
    pub fn new(
        resource_id: impl Into<String>,
        description: impl Into<String>,
        source_version: ApiVersion,
        instance: Arc<ServiceInstance>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            description: description.into(),
            source_version,
            instance,
            credential: None,
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// API version the model was created under at the source
    pub fn source_version(&self) -> &ApiVersion {
        &self.source_version
    }

    pub fn instance(&self) -> &ServiceInstance {
        &self.instance
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// The only mutation a descriptor allows after creation
    pub fn attach_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }
}

/// Non-terminal protocol phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    VersionCheck,
    Authorizing,
    CopyInitiating,
    Polling,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferPhase::VersionCheck => "VersionCheck",
            TransferPhase::Authorizing => "Authorizing",
            TransferPhase::CopyInitiating => "CopyInitiating",
            TransferPhase::Polling => "Polling",
        };
        f.write_str(name)
    }
}

/// Everything recorded about a failed resource
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub resource_id: String,
    pub instance: String,
    pub phase: TransferPhase,
    pub error: String,
    pub provider_detail: Option<String>,
}

impl FailureRecord {
    pub fn from_error(
        resource_id: &str,
        instance: &ServiceInstance,
        phase: TransferPhase,
        error: &MigrationError,
    ) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            instance: instance.to_string(),
            phase,
            error: error.to_string(),
            provider_detail: error.provider_detail(),
        }
    }
}

/// Per-resource protocol state
#[derive(Debug, Clone, PartialEq)]
pub enum TransferState {
    VersionCheck,
    Authorizing,
    CopyInitiating,
    Polling,
    Completed { final_status: String },
    Skipped { reason: String },
    Failed(FailureRecord),
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        self.phase().is_none()
    }

    pub fn phase(&self) -> Option<TransferPhase> {
        match self {
            TransferState::VersionCheck => Some(TransferPhase::VersionCheck),
            TransferState::Authorizing => Some(TransferPhase::Authorizing),
            TransferState::CopyInitiating => Some(TransferPhase::CopyInitiating),
            TransferState::Polling => Some(TransferPhase::Polling),
            _ => None,
        }
    }
}

/// Terminal outcome of one resource
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceOutcome {
    Completed { final_status: String },
    Skipped { reason: String },
    Failed(FailureRecord),
}

impl ResourceOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceOutcome::Completed { .. } => "Completed",
            ResourceOutcome::Skipped { .. } => "Skipped",
            ResourceOutcome::Failed(_) => "Failed",
        }
    }

    pub fn reason(&self) -> String {
        match self {
            ResourceOutcome::Completed { final_status } => format!("status: {}", final_status),
            ResourceOutcome::Skipped { reason } => reason.clone(),
            ResourceOutcome::Failed(failure) => match &failure.provider_detail {
                Some(detail) if !failure.error.contains(detail.as_str()) => {
                    format!("[{}] {} ({})", failure.phase, failure.error, detail)
                }
                _ => format!("[{}] {}", failure.phase, failure.error),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceReport {
    pub resource_id: String,
    pub instance: String,
    pub outcome: ResourceOutcome,
}

/// Summary of one batch run
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub destination: String,
    pub destination_version: ApiVersion,
    pub diagnostics: Vec<CapabilityProbeResult>,
    pub resources: Vec<ResourceReport>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ResourceOutcome::Completed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ResourceOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ResourceOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, predicate: impl Fn(&ResourceOutcome) -> bool) -> usize {
        self.resources
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }

    /// Operator-facing summary table
    pub fn render_summary(&self) -> String {
        let id_width = self
            .resources
            .iter()
            .map(|r| r.resource_id.len())
            .chain(std::iter::once("MODEL".len()))
            .max()
            .unwrap_or(0);
        let instance_width = self
            .resources
            .iter()
            .map(|r| r.instance.len())
            .chain(std::iter::once("SOURCE".len()))
            .max()
            .unwrap_or(0);

        let mut out = format!(
            "Destination: {} (API {})\n",
            self.destination, self.destination_version
        );
        out.push_str(&format!(
            "{:<id_width$}  {:<instance_width$}  {:<9}  REASON\n",
            "MODEL", "SOURCE", "RESULT"
        ));
        for report in &self.resources {
            out.push_str(&format!(
                "{:<id_width$}  {:<instance_width$}  {:<9}  {}\n",
                report.resource_id,
                report.instance,
                report.outcome.label(),
                report.outcome.reason()
            ));
        }
        out.push_str(&format!(
            "{} completed, {} skipped, {} failed\n",
            self.completed(),
            self.skipped(),
            self.failed()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str, outcome: ResourceOutcome) -> ResourceReport {
        ResourceReport {
            resource_id: id.to_string(),
            instance: "docs-east (contoso/prod)".to_string(),
            outcome,
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TransferState::Polling.is_terminal());
        assert!(TransferState::Skipped {
            reason: "x".to_string()
        }
        .is_terminal());
        assert_eq!(
            TransferState::Authorizing.phase(),
            Some(TransferPhase::Authorizing)
        );
    }

    #[test]
    fn test_batch_report_counts_and_summary() {
        let batch = BatchReport {
            destination: "docs-west (fabrikam/shared)".to_string(),
            destination_version: ApiVersion::parse("2023-07-31").unwrap(),
            diagnostics: Vec::new(),
            resources: vec![
                report(
                    "invoices",
                    ResourceOutcome::Completed {
                        final_status: "succeeded".to_string(),
                    },
                ),
                report(
                    "claims",
                    ResourceOutcome::Skipped {
                        reason: "2024-11-30 > 2023-07-31".to_string(),
                    },
                ),
                report(
                    "receipts",
                    ResourceOutcome::Failed(FailureRecord {
                        resource_id: "receipts".to_string(),
                        instance: "docs-east (contoso/prod)".to_string(),
                        phase: TransferPhase::Authorizing,
                        error: "Copy authorization conflict for receipts: declined".to_string(),
                        provider_detail: Some("Conflict: model exists".to_string()),
                    }),
                ),
            ],
        };

        assert_eq!(batch.completed(), 1);
        assert_eq!(batch.skipped(), 1);
        assert_eq!(batch.failed(), 1);
        assert!(batch.has_failures());

        let summary = batch.render_summary();
        assert!(summary.contains("invoices"));
        assert!(summary.contains("[Authorizing]"));
        assert!(summary.contains("Conflict: model exists"));
        assert!(summary.ends_with("1 completed, 1 skipped, 1 failed\n"));
    }

    #[test]
    fn test_descriptor_credential_attach() {
        let instance = Arc::new(ServiceInstance {
            domain: "contoso".to_string(),
            subaccount: "prod".to_string(),
            resource_group: "rg".to_string(),
            account_name: "docs-east".to_string(),
            base_url: "https://docs-east.example.com".to_string(),
        });
        let mut descriptor = ResourceDescriptor::new(
            "invoices",
            "Invoice extractor",
            ApiVersion::parse("2023-07-31").unwrap(),
            instance,
        );
        assert!(descriptor.credential().is_none());

        descriptor.attach_credential(Credential::new("k"));
        assert_eq!(descriptor.credential().map(|c| c.api_key()), Some("k"));
        assert_eq!(descriptor.source_version().as_str(), "2023-07-31");
    }
}
