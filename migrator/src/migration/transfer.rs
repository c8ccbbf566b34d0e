//! Per-resource transfer state machine
//!
//! ```text
//! VersionCheck ─▶ Authorizing ─▶ CopyInitiating ─▶ Polling ─▶ Completed
//!      │               │               │              │
//!      ▼               ▼               ▼              ▼
//!   Skipped          Failed          Failed         Failed
//! ```
//!
//! Authorizing runs under the destination's context; copy and poll run under
//! the resource's source context.

use tracing::{debug, error, info};

use crate::migration::cancel::CancellationSignal;
use crate::migration::confirm::Confirmation;
use crate::migration::progress::ProgressContext;
use crate::migration::steps::{
    authorize_with_recovery, check_version, initiate_copy, poll_to_completion,
};
use crate::migration::types::{
    FailureRecord, ResourceDescriptor, ResourceOutcome, TransferPhase, TransferState,
};
use crate::services::client::{
    ApiVersionCapability, ClientError, ContextSwitcher, Credential, ManagementApi,
    OperationHandle, ServiceInstance, TransferAuthorization,
};
use crate::services::config::PollConfig;
use crate::services::errors::MigrationError;

/// Everything a transfer needs that is shared across the batch
pub struct TransferEnv<'a, A: ManagementApi + ?Sized> {
    pub api: &'a A,
    pub switcher: &'a dyn ContextSwitcher,
    pub confirmation: &'a dyn Confirmation,
    pub destination: &'a ServiceInstance,
    pub destination_credential: &'a Credential,
    /// Best version of the destination, used for every call of the transfer
    pub destination_best: &'a ApiVersionCapability,
    pub poll: &'a PollConfig,
    pub cancel: &'a CancellationSignal,
}

pub struct TransferStateMachine<'a, A: ManagementApi + ?Sized> {
    env: &'a TransferEnv<'a, A>,
    resource: &'a ResourceDescriptor,
    state: TransferState,
    authorization: Option<TransferAuthorization>,
    handle: Option<OperationHandle>,
}

impl<'a, A: ManagementApi + ?Sized> TransferStateMachine<'a, A> {
    pub fn new(env: &'a TransferEnv<'a, A>, resource: &'a ResourceDescriptor) -> Self {
        Self {
            env,
            resource,
            state: TransferState::VersionCheck,
            authorization: None,
            handle: None,
        }
    }

    pub fn state(&self) -> &TransferState {
        &self.state
    }

    /// Drive the resource to a terminal state
    pub async fn run(mut self, progress: &mut ProgressContext<'_>) -> ResourceOutcome {
        loop {
            match self.state {
                TransferState::Completed { final_status } => {
                    return ResourceOutcome::Completed { final_status }
                }
                TransferState::Skipped { reason } => return ResourceOutcome::Skipped { reason },
                TransferState::Failed(failure) => return ResourceOutcome::Failed(failure),
                active => {
                    self.state = active;
                    self.step(progress).await;
                }
            }
        }
    }

    /// Perform one transition; terminal states are left untouched
    pub async fn step(&mut self, progress: &mut ProgressContext<'_>) -> &TransferState {
        let Some(phase) = self.state.phase() else {
            return &self.state;
        };

        if self.env.cancel.is_cancelled() {
            let err = MigrationError::Cancelled {
                resource_id: self.resource.resource_id().to_string(),
            };
            self.state = self.fail(phase, err);
            return &self.state;
        }

        progress.phase(self.resource.resource_id(), phase);

        let next = match phase {
            TransferPhase::VersionCheck => self.version_check(progress),
            TransferPhase::Authorizing => self.authorize(progress).await,
            TransferPhase::CopyInitiating => self.copy().await,
            TransferPhase::Polling => self.poll(progress).await,
        };

        debug!(
            "{}: {} -> {:?}",
            self.resource.resource_id(),
            phase,
            next
        );
        self.state = next;
        &self.state
    }

    fn version_check(&self, progress: &ProgressContext<'_>) -> TransferState {
        match check_version(self.resource, &self.env.destination_best.version) {
            Ok(()) => TransferState::Authorizing,
            Err(e @ MigrationError::VersionIncompatible { .. }) => {
                let reason = e.to_string();
                progress.warning(format!("Skipping: {}", reason));
                TransferState::Skipped { reason }
            }
            Err(e) => self.fail(TransferPhase::VersionCheck, e),
        }
    }

    async fn authorize(&mut self, progress: &mut ProgressContext<'_>) -> TransferState {
        let env = self.env;
        let ctx = match env.switcher.activate_for(env.destination) {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(TransferPhase::Authorizing, e),
        };

        match authorize_with_recovery(
            env.api,
            env.confirmation,
            progress,
            &ctx,
            env.destination,
            env.destination_credential,
            env.destination_best,
            self.resource,
        )
        .await
        {
            Ok(authorization) => {
                self.authorization = Some(authorization);
                TransferState::CopyInitiating
            }
            Err(e) => self.fail(TransferPhase::Authorizing, e),
        }
    }

    async fn copy(&mut self) -> TransferState {
        let env = self.env;
        let Some(authorization) = self.authorization.take() else {
            return self.fail(
                TransferPhase::CopyInitiating,
                self.missing("copy authorization", TransferPhase::CopyInitiating),
            );
        };

        let ctx = match env.switcher.activate_for(self.resource.instance()) {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(TransferPhase::CopyInitiating, e),
        };

        match initiate_copy(env.api, &ctx, env.destination_best, self.resource, authorization)
            .await
        {
            Ok(handle) => {
                self.handle = Some(handle);
                TransferState::Polling
            }
            Err(e) => self.fail(TransferPhase::CopyInitiating, e),
        }
    }

    async fn poll(&mut self, progress: &mut ProgressContext<'_>) -> TransferState {
        let env = self.env;
        let resource = self.resource;
        let Some(handle) = self.handle.as_ref() else {
            return self.fail(
                TransferPhase::Polling,
                self.missing("operation handle", TransferPhase::Polling),
            );
        };
        let Some(credential) = resource.credential() else {
            return self.fail(
                TransferPhase::Polling,
                MigrationError::AuthResolution {
                    instance: resource.instance().to_string(),
                    message: format!("no credential attached to {}", resource.resource_id()),
                },
            );
        };

        let ctx = match env.switcher.activate_for(resource.instance()) {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(TransferPhase::Polling, e),
        };

        match poll_to_completion(
            env.api,
            &ctx,
            resource.instance(),
            credential,
            resource.resource_id(),
            handle,
            env.poll,
            env.cancel,
            progress,
        )
        .await
        {
            Ok(final_status) => {
                info!("{} migrated: {}", resource.resource_id(), final_status);
                TransferState::Completed { final_status }
            }
            Err(e) => self.fail(TransferPhase::Polling, e),
        }
    }

    fn missing(&self, what: &str, phase: TransferPhase) -> MigrationError {
        MigrationError::TransferRequest {
            phase,
            resource_id: self.resource.resource_id().to_string(),
            source: ClientError::InvalidResponse {
                expected: what.to_string(),
                got: "nothing".to_string(),
            },
        }
    }

    fn fail(&self, phase: TransferPhase, err: MigrationError) -> TransferState {
        let record = FailureRecord::from_error(
            self.resource.resource_id(),
            self.resource.instance(),
            phase,
            &err,
        );
        match &record.provider_detail {
            Some(detail) => error!("{} ({:?}): {}", err, err.severity(), detail),
            None => error!("{} ({:?})", err, err.severity()),
        }
        TransferState::Failed(record)
    }
}
