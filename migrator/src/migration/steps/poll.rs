//! Polling: follow the copy operation until the provider reports 100%

use std::time::Instant;

use tracing::{debug, warn};

use crate::migration::cancel::CancellationSignal;
use crate::migration::progress::ProgressContext;
use crate::services::client::{
    ActiveContext, Credential, ManagementApi, OperationHandle, ServiceInstance,
};
use crate::services::config::PollConfig;
use crate::services::errors::{MigrationError, MigrationResult};

/// Poll `handle` until completion and return the final provider status.
///
/// Completion is `percentCompleted == 100`; a response without a percentage
/// keeps polling. A failed or canceled provider status, a transport error,
/// exhausting `config`'s bounds and cancellation all end the wait with an error.
#[allow(clippy::too_many_arguments)]
pub async fn poll_to_completion<A: ManagementApi + ?Sized>(
    api: &A,
    ctx: &ActiveContext,
    source: &ServiceInstance,
    credential: &Credential,
    resource_id: &str,
    handle: &OperationHandle,
    config: &PollConfig,
    cancel: &CancellationSignal,
    progress: &mut ProgressContext<'_>,
) -> MigrationResult<String> {
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(MigrationError::Cancelled {
                resource_id: resource_id.to_string(),
            });
        }

        attempts += 1;
        let status = api
            .poll_operation(ctx, source, credential, handle)
            .await
            .map_err(|e| MigrationError::Poll {
                resource_id: resource_id.to_string(),
                message: e.to_string(),
                detail: e.provider_detail().map(str::to_string),
            })?;

        progress.poll_update(resource_id, &status.status, status.percent_completed);

        if status.is_complete() {
            debug!("{} completed after {} polls", resource_id, attempts);
            return Ok(status.status);
        }

        if status.is_failed() {
            return Err(MigrationError::Poll {
                resource_id: resource_id.to_string(),
                message: format!("provider reported status '{}'", status.status),
                detail: status.error.as_ref().map(|e| e.detail()),
            });
        }

        if attempts >= config.max_attempts || started.elapsed() >= config.max_duration() {
            warn!(
                "Giving up on {} after {} polls, last status '{}'",
                resource_id, attempts, status.status
            );
            return Err(MigrationError::PollTimeout {
                resource_id: resource_id.to_string(),
                attempts,
                elapsed_secs: started.elapsed().as_secs(),
            });
        }

        tokio::select! {
            _ = tokio::time::sleep(config.interval()) => {}
            _ = cancel.cancelled() => {
                return Err(MigrationError::Cancelled {
                    resource_id: resource_id.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::progress::MigrationEvent;
    use crate::testing::{instance, RecordingEvents, ScriptedApi};

    fn fast(max_attempts: u32) -> PollConfig {
        PollConfig {
            interval_ms: 0,
            max_attempts,
            max_duration_secs: 60,
        }
    }

    async fn poll(
        api: &ScriptedApi,
        config: &PollConfig,
        cancel: &CancellationSignal,
        events: &RecordingEvents,
    ) -> MigrationResult<String> {
        let east = instance("east", "tenant-a");
        let mut progress = ProgressContext::new(1, events);
        poll_to_completion(
            api,
            &ActiveContext::of(&east),
            &east,
            &Credential::new("k"),
            "invoices",
            &OperationHandle {
                url: "https://east.example.com/operations/1".to_string(),
            },
            config,
            cancel,
            &mut progress,
        )
        .await
    }

    #[tokio::test]
    async fn test_completes_after_exactly_three_polls() {
        let api = ScriptedApi::new();
        api.poll_percent("running", Some(10));
        api.poll_percent("running", Some(55));
        api.poll_percent("succeeded", Some(100));
        let events = RecordingEvents::default();

        let status = poll(&api, &fast(10), &CancellationSignal::new(), &events)
            .await
            .unwrap();

        assert_eq!(status, "succeeded");
        assert_eq!(api.poll_calls(), 3);
        assert!(events.contains(&MigrationEvent::PollProgress {
            resource_id: "invoices".to_string(),
            status: "running".to_string(),
            percent: Some(55),
        }));
    }

    #[tokio::test]
    async fn test_missing_percentage_keeps_polling() {
        let api = ScriptedApi::new();
        api.poll_percent("notStarted", None);
        api.poll_percent("running", None);
        api.poll_percent("succeeded", Some(100));

        let status = poll(
            &api,
            &fast(10),
            &CancellationSignal::new(),
            &RecordingEvents::default(),
        )
        .await
        .unwrap();

        assert_eq!(status, "succeeded");
        assert_eq!(api.poll_calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_status_stops_polling() {
        let api = ScriptedApi::new();
        api.poll_percent("running", Some(30));
        api.poll_percent("failed", Some(30));

        let result = poll(
            &api,
            &fast(10),
            &CancellationSignal::new(),
            &RecordingEvents::default(),
        )
        .await;

        assert!(matches!(result, Err(MigrationError::Poll { .. })));
        assert_eq!(api.poll_calls(), 2);
    }

    #[tokio::test]
    async fn test_poll_transport_error_fails() {
        let api = ScriptedApi::new();
        api.poll_status(503);

        let result = poll(
            &api,
            &fast(10),
            &CancellationSignal::new(),
            &RecordingEvents::default(),
        )
        .await;

        assert!(matches!(result, Err(MigrationError::Poll { .. })));
    }

    #[tokio::test]
    async fn test_attempt_bound_times_out() {
        let api = ScriptedApi::new();
        for _ in 0..5 {
            api.poll_percent("running", Some(50));
        }

        let result = poll(
            &api,
            &fast(3),
            &CancellationSignal::new(),
            &RecordingEvents::default(),
        )
        .await;

        match result {
            Err(MigrationError::PollTimeout { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected PollTimeout, got {:?}", other),
        }
        assert_eq!(api.poll_calls(), 3);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_wait() {
        let api = ScriptedApi::new();
        for _ in 0..5 {
            api.poll_percent("running", Some(50));
        }
        let cancel = CancellationSignal::new();
        let config = PollConfig {
            interval_ms: 60_000,
            max_attempts: 10,
            max_duration_secs: 600,
        };

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            poll(&api, &config, &cancel, &RecordingEvents::default()),
        )
        .await
        .expect("cancellation should end the wait");

        assert!(matches!(result, Err(MigrationError::Cancelled { .. })));
        assert_eq!(api.poll_calls(), 1);
    }
}
