//! Cross-domain model migration engine.
//!
//! The crate moves trained models between independently administered service
//! instances through the provider's versioned management API: it probes each
//! instance for the newest API version it answers, then drives an
//! authorize → copy → poll protocol per model with recovery for orphaned
//! destination models.

pub mod migration;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use migration::{
    BatchOrchestrator, BatchReport, ResourceDescriptor, ResourceOutcome, TransferPhase,
};
pub use services::client::{
    ActiveContext, ApiVersion, Credential, HttpManagementClient, ManagementApi, ServiceInstance,
    VersionCatalog,
};
pub use services::config::{MigrationConfig, RunFile};
pub use services::errors::{MigrationError, MigrationResult};
