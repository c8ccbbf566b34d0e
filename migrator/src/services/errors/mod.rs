use thiserror::Error;

use crate::migration::probe::CapabilityProbeResult;
use crate::migration::types::TransferPhase;
use crate::services::client::ClientError;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Credential resolution failed for {instance}: {message}")]
    AuthResolution { instance: String, message: String },

    #[error("Cannot activate context {domain}/{subaccount}: {reason}")]
    ContextSwitch {
        domain: String,
        subaccount: String,
        reason: String,
    },

    #[error("No API version answered on {instance} ({} versions probed)", .diagnostics.len())]
    NoCapableVersion {
        instance: String,
        diagnostics: Vec<CapabilityProbeResult>,
    },

    #[error("Listing models on {instance} failed: {source}")]
    Enumeration {
        instance: String,
        #[source]
        source: ClientError,
    },

    #[error("Model {resource_id} uses API version {source_version} > destination's {destination_version}")]
    VersionIncompatible {
        resource_id: String,
        source_version: String,
        destination_version: String,
    },

    #[error("Copy authorization conflict for {resource_id}: {message}")]
    AuthorizationConflict {
        resource_id: String,
        message: String,
        detail: Option<String>,
    },

    #[error("{phase} failed for {resource_id}: {source}")]
    TransferRequest {
        phase: TransferPhase,
        resource_id: String,
        #[source]
        source: ClientError,
    },

    #[error("Polling failed for {resource_id}: {message}")]
    Poll {
        resource_id: String,
        message: String,
        detail: Option<String>,
    },

    #[error("Polling {resource_id} timed out after {attempts} polls ({elapsed_secs}s)")]
    PollTimeout {
        resource_id: String,
        attempts: u32,
        elapsed_secs: u64,
    },

    #[error("Migration of {resource_id} cancelled")]
    Cancelled { resource_id: String },

    #[error("Configuration error: {field} = {value}")]
    Configuration { field: String, value: String },
}

pub type MigrationResult<T> = Result<T, MigrationError>;

impl MigrationError {
    /// Errors that abort the whole batch before or instead of resource work
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MigrationError::AuthResolution { .. }
                | MigrationError::ContextSwitch { .. }
                | MigrationError::NoCapableVersion { .. }
                | MigrationError::Enumeration { .. }
                | MigrationError::Configuration { .. }
        )
    }

    /// Provider-supplied error text, when any was returned
    pub fn provider_detail(&self) -> Option<String> {
        match self {
            MigrationError::TransferRequest { source, .. }
            | MigrationError::Enumeration { source, .. } => {
                source.provider_detail().map(str::to_string)
            }
            MigrationError::AuthorizationConflict { detail, .. }
            | MigrationError::Poll { detail, .. } => detail.clone(),
            _ => None,
        }
    }

    /// Get error severity for logging purposes
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MigrationError::AuthResolution { .. }
            | MigrationError::ContextSwitch { .. }
            | MigrationError::NoCapableVersion { .. } => ErrorSeverity::Critical,
            MigrationError::Configuration { .. } | MigrationError::Enumeration { .. } => {
                ErrorSeverity::High
            }
            MigrationError::AuthorizationConflict { .. }
            | MigrationError::TransferRequest { .. }
            | MigrationError::Poll { .. }
            | MigrationError::PollTimeout { .. } => ErrorSeverity::Medium,
            MigrationError::VersionIncompatible { .. } | MigrationError::Cancelled { .. } => {
                ErrorSeverity::Low
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(MigrationError::ContextSwitch {
            domain: "tenant-a".to_string(),
            subaccount: "sub".to_string(),
            reason: "denied".to_string(),
        }
        .is_fatal());

        assert!(!MigrationError::VersionIncompatible {
            resource_id: "m".to_string(),
            source_version: "2024-11-30".to_string(),
            destination_version: "2023-07-31".to_string(),
        }
        .is_fatal());

        assert!(!MigrationError::PollTimeout {
            resource_id: "m".to_string(),
            attempts: 3,
            elapsed_secs: 3,
        }
        .is_fatal());
    }

    #[test]
    fn test_provider_detail_from_client_error() {
        let err = MigrationError::TransferRequest {
            phase: TransferPhase::CopyInitiating,
            resource_id: "invoices".to_string(),
            source: ClientError::HttpStatus {
                operation: "initiate_copy".to_string(),
                status: 400,
                detail: Some("InvalidArgument: bad authorization".to_string()),
            },
        };
        assert_eq!(
            err.provider_detail().as_deref(),
            Some("InvalidArgument: bad authorization")
        );
        assert!(err.to_string().starts_with("CopyInitiating failed for invoices"));
    }

    #[test]
    fn test_version_incompatible_message_names_both_versions() {
        let err = MigrationError::VersionIncompatible {
            resource_id: "R".to_string(),
            source_version: "v3".to_string(),
            destination_version: "v2".to_string(),
        };
        assert!(err.to_string().contains("v3 > destination's v2"));
    }
}
