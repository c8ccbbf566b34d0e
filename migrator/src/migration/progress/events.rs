//! Migration progress events and event handling

use tracing::{debug, error, info, warn};

use crate::migration::types::TransferPhase;

/// Events that can occur during a batch run
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationEvent {
    BatchStarted {
        total: usize,
        destination: String,
        destination_version: String,
    },
    ResourceStarted {
        index: usize,
        total: usize,
        resource_id: String,
    },
    PhaseEntered {
        resource_id: String,
        phase: TransferPhase,
    },
    PollProgress {
        resource_id: String,
        status: String,
        percent: Option<u32>,
    },
    ConflictRecovery {
        resource_id: String,
        accepted: bool,
    },
    Warning {
        message: String,
    },
    ResourceFinished {
        resource_id: String,
        outcome: &'static str,
        processed: usize,
        total: usize,
    },
    BatchCompleted {
        completed: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Event handler for migration events
pub trait MigrationEventHandler: Send + Sync {
    fn handle_event(&self, event: &MigrationEvent);
}

/// Writes events to the tracing subscriber
pub struct LoggingEventHandler;

impl MigrationEventHandler for LoggingEventHandler {
    fn handle_event(&self, event: &MigrationEvent) {
        match event {
            MigrationEvent::BatchStarted {
                total,
                destination,
                destination_version,
            } => {
                info!(
                    "[Batch] 🚀 Migrating {} models to {} (API {})",
                    total, destination, destination_version
                );
            }
            MigrationEvent::ResourceStarted {
                index,
                total,
                resource_id,
            } => {
                info!("[Batch] 📋 Model {}/{}: {}", index + 1, total, resource_id);
            }
            MigrationEvent::PhaseEntered { resource_id, phase } => {
                debug!("[{}] entering {}", resource_id, phase);
            }
            MigrationEvent::PollProgress {
                resource_id,
                status,
                percent,
            } => match percent {
                Some(percent) => info!("[{}] {} ({}%)", resource_id, status, percent),
                None => info!("[{}] {}", resource_id, status),
            },
            MigrationEvent::ConflictRecovery {
                resource_id,
                accepted,
            } => {
                if *accepted {
                    warn!("[{}] deleting orphaned destination model and retrying", resource_id);
                } else {
                    warn!("[{}] conflict recovery declined", resource_id);
                }
            }
            MigrationEvent::Warning { message } => {
                warn!("⚠️ {}", message);
            }
            MigrationEvent::ResourceFinished {
                resource_id,
                outcome,
                processed,
                total,
            } => {
                if *outcome == "Failed" {
                    error!(
                        "[Batch] ❌ {} failed ({}/{} processed)",
                        resource_id, processed, total
                    );
                } else {
                    info!(
                        "[Batch] ✅ {} {} ({}/{} processed)",
                        resource_id,
                        outcome.to_lowercase(),
                        processed,
                        total
                    );
                }
            }
            MigrationEvent::BatchCompleted {
                completed,
                skipped,
                failed,
            } => {
                if *failed == 0 {
                    info!(
                        "[Batch] 🎉 Done: {} completed, {} skipped",
                        completed, skipped
                    );
                } else {
                    error!(
                        "[Batch] Done with failures: {} completed, {} skipped, {} failed",
                        completed, skipped, failed
                    );
                }
            }
        }
    }
}
