//! Domain context switching
//!
//! Remote calls take the [`ActiveContext`] they run under as an explicit
//! parameter instead of relying on an ambient session.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{debug, info};

use super::errors::ClientError;
use super::types::ServiceInstance;
use crate::services::errors::MigrationError;

/// Domain + subaccount that subsequent calls run as
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActiveContext {
    pub domain: String,
    pub subaccount: String,
}

impl ActiveContext {
    pub fn new(domain: impl Into<String>, subaccount: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            subaccount: subaccount.into(),
        }
    }

    pub fn of(instance: &ServiceInstance) -> Self {
        Self::new(&instance.domain, &instance.subaccount)
    }

    pub fn covers(&self, instance: &ServiceInstance) -> bool {
        self.domain == instance.domain && self.subaccount == instance.subaccount
    }

    /// Fail unless this context owns `instance`
    pub fn ensure_covers(
        &self,
        instance: &ServiceInstance,
        operation: &str,
    ) -> Result<(), ClientError> {
        if self.covers(instance) {
            Ok(())
        } else {
            Err(ClientError::ContextMismatch {
                operation: operation.to_string(),
                active: self.to_string(),
                required: ActiveContext::of(instance).to_string(),
            })
        }
    }
}

impl fmt::Display for ActiveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.subaccount)
    }
}

pub trait ContextSwitcher: Send + Sync {
    /// Fail with `ContextSwitch` unless the operator holds rights in `domain`
    fn verify_access(&self, domain: &str) -> Result<(), MigrationError>;

    /// Make `domain`/`subaccount` active; re-activating the active context is a no-op
    fn activate(&self, domain: &str, subaccount: &str) -> Result<ActiveContext, MigrationError>;

    fn activate_for(&self, instance: &ServiceInstance) -> Result<ActiveContext, MigrationError> {
        self.activate(&instance.domain, &instance.subaccount)
    }
}

/// Switcher over the set of domains the operator has signed in to
pub struct SessionContextSwitcher {
    signed_in: HashSet<String>,
    active: Mutex<Option<ActiveContext>>,
    switches: AtomicUsize,
}

impl SessionContextSwitcher {
    pub fn new<I, S>(signed_in_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            signed_in: signed_in_domains.into_iter().map(Into::into).collect(),
            active: Mutex::new(None),
            switches: AtomicUsize::new(0),
        }
    }

    pub fn current(&self) -> Option<ActiveContext> {
        self.active.lock().ok().and_then(|active| active.clone())
    }

    /// Number of activations that actually changed the active context
    pub fn switch_count(&self) -> usize {
        self.switches.load(Ordering::Relaxed)
    }
}

impl ContextSwitcher for SessionContextSwitcher {
    fn verify_access(&self, domain: &str) -> Result<(), MigrationError> {
        if self.signed_in.contains(domain) {
            Ok(())
        } else {
            Err(MigrationError::ContextSwitch {
                domain: domain.to_string(),
                subaccount: String::new(),
                reason: "no signed-in session for this domain".to_string(),
            })
        }
    }

    fn activate(&self, domain: &str, subaccount: &str) -> Result<ActiveContext, MigrationError> {
        if !self.signed_in.contains(domain) {
            return Err(MigrationError::ContextSwitch {
                domain: domain.to_string(),
                subaccount: subaccount.to_string(),
                reason: "no signed-in session for this domain".to_string(),
            });
        }

        let requested = ActiveContext::new(domain, subaccount);
        let mut active = self.active.lock().map_err(|_| MigrationError::ContextSwitch {
            domain: domain.to_string(),
            subaccount: subaccount.to_string(),
            reason: "context state poisoned".to_string(),
        })?;

        if active.as_ref() == Some(&requested) {
            debug!("Context {} already active", requested);
            return Ok(requested);
        }

        info!("Switching context to {}", requested);
        *active = Some(requested.clone());
        self.switches.fetch_add(1, Ordering::Relaxed);
        Ok(requested)
    }
}
