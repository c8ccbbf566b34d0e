//! Operator confirmation for the conflict-recovery path

use async_trait::async_trait;
use tracing::info;

/// Yes/no question put to the operator
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Fixed answer for unattended runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoConfirm {
    accept: bool,
}

impl AutoConfirm {
    pub fn accept() -> Self {
        Self { accept: true }
    }

    pub fn decline() -> Self {
        Self { accept: false }
    }
}

#[async_trait]
impl Confirmation for AutoConfirm {
    async fn confirm(&self, message: &str) -> bool {
        info!(
            "Auto-{} confirmation: {}",
            if self.accept { "accepting" } else { "declining" },
            message
        );
        self.accept
    }
}
