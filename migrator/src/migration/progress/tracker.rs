//! Per-run progress context threaded through the orchestrator and state machine

use crate::migration::progress::events::{MigrationEvent, MigrationEventHandler};
use crate::migration::types::{ResourceOutcome, TransferPhase};

/// Where the current resource is in its protocol
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceProgress {
    pub index: usize,
    pub resource_id: String,
    pub phase: Option<TransferPhase>,
    pub percent: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchProgress {
    pub total: usize,
    /// Resources that reached a terminal state, whatever the outcome
    pub processed: usize,
    pub current: Option<ResourceProgress>,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Progress state plus the handler that hears about every change
pub struct ProgressContext<'a> {
    state: BatchProgress,
    events: &'a dyn MigrationEventHandler,
}

impl<'a> ProgressContext<'a> {
    pub fn new(total: usize, events: &'a dyn MigrationEventHandler) -> Self {
        Self {
            state: BatchProgress::new(total),
            events,
        }
    }

    pub fn snapshot(&self) -> &BatchProgress {
        &self.state
    }

    pub fn emit(&self, event: MigrationEvent) {
        self.events.handle_event(&event);
    }

    pub fn resource_started(&mut self, index: usize, resource_id: &str) {
        self.state.current = Some(ResourceProgress {
            index,
            resource_id: resource_id.to_string(),
            phase: None,
            percent: None,
        });
        self.emit(MigrationEvent::ResourceStarted {
            index,
            total: self.state.total,
            resource_id: resource_id.to_string(),
        });
    }

    pub fn phase(&mut self, resource_id: &str, phase: TransferPhase) {
        if let Some(current) = self.state.current.as_mut() {
            current.phase = Some(phase);
            current.percent = None;
        }
        self.emit(MigrationEvent::PhaseEntered {
            resource_id: resource_id.to_string(),
            phase,
        });
    }

    pub fn poll_update(&mut self, resource_id: &str, status: &str, percent: Option<u32>) {
        if let Some(current) = self.state.current.as_mut() {
            current.percent = percent;
        }
        self.emit(MigrationEvent::PollProgress {
            resource_id: resource_id.to_string(),
            status: status.to_string(),
            percent,
        });
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(MigrationEvent::Warning {
            message: message.into(),
        });
    }

    pub fn resource_finished(&mut self, resource_id: &str, outcome: &ResourceOutcome) {
        self.state.processed += 1;
        self.state.current = None;
        self.emit(MigrationEvent::ResourceFinished {
            resource_id: resource_id.to_string(),
            outcome: outcome.label(),
            processed: self.state.processed,
            total: self.state.total,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingEvents;

    #[test]
    fn test_fraction_counts_every_outcome() {
        let events = RecordingEvents::default();
        let mut progress = ProgressContext::new(4, &events);
        assert_eq!(progress.snapshot().fraction(), 0.0);

        progress.resource_started(0, "a");
        progress.phase("a", TransferPhase::Polling);
        progress.poll_update("a", "running", Some(55));
        assert_eq!(
            progress.snapshot().current.as_ref().and_then(|c| c.percent),
            Some(55)
        );

        progress.resource_finished(
            "a",
            &ResourceOutcome::Skipped {
                reason: "newer".to_string(),
            },
        );
        assert_eq!(progress.snapshot().fraction(), 0.25);
        assert!(progress.snapshot().current.is_none());
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_empty_batch_is_complete() {
        assert_eq!(BatchProgress::new(0).fraction(), 1.0);
    }
}
