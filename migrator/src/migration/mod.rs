// Migration engine
//
// This module provides:
// - Capability probing of service instances
// - The per-model authorize -> copy -> poll state machine and its steps
// - Batch orchestration with progress events, confirmation and cancellation

pub mod cancel;
pub mod confirm;
pub mod orchestrator;
pub mod probe;
pub mod progress;
pub mod steps;
pub mod transfer;
pub mod types;

pub use cancel::CancellationSignal;
pub use confirm::{AutoConfirm, Confirmation};
pub use orchestrator::{BatchOrchestrator, InventoryEntry, SourceInventory};
pub use probe::{probe_best, CapabilityProbeResult, ProbeReport, ProbeStatus};
pub use progress::{
    BatchProgress, LoggingEventHandler, MigrationEvent, MigrationEventHandler, ProgressContext,
};
pub use transfer::{TransferEnv, TransferStateMachine};
pub use types::{
    BatchReport, FailureRecord, ResourceDescriptor, ResourceOutcome, ResourceReport,
    TransferPhase, TransferState,
};
