mod run_file;

use std::time::Duration;

use serde::Deserialize;

use crate::services::errors::{MigrationError, MigrationResult};

pub use run_file::{InstanceSpec, RunFile};

/// Name prefix the provider reserves for built-in models
pub const SYSTEM_RESOURCE_PREFIX: &str = "prebuilt-";

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MigrationConfig {
    pub http: HttpConfig,
    pub poll: PollConfig,
    pub probe: ProbeConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

/// Copy-operation polling bounds
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
    pub max_duration_secs: u64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    /// Models with this prefix are excluded from counts and enumeration
    pub system_resource_prefix: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("model-migrator/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_attempts: 3600,
            max_duration_secs: 2 * 60 * 60,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            system_resource_prefix: SYSTEM_RESOURCE_PREFIX.to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn is_system_resource(&self, resource_id: &str) -> bool {
        !self.system_resource_prefix.is_empty()
            && resource_id.starts_with(&self.system_resource_prefix)
    }
}

impl MigrationConfig {
    pub fn validate(&self) -> MigrationResult<()> {
        if self.http.request_timeout_secs == 0 {
            return Err(invalid("http.request_timeout_secs", "0"));
        }

        if self.poll.max_attempts == 0 {
            return Err(invalid("poll.max_attempts", "0"));
        }

        if self.poll.max_duration_secs == 0 {
            return Err(invalid("poll.max_duration_secs", "0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, value: &str) -> MigrationError {
    MigrationError::Configuration {
        field: field.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MigrationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_poll_bound_rejected() {
        let mut config = MigrationConfig::default();
        config.poll.max_attempts = 0;

        match config.validate() {
            Err(MigrationError::Configuration { field, .. }) => {
                assert_eq!(field, "poll.max_attempts")
            }
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_system_resource_prefix() {
        let probe = ProbeConfig::default();
        assert!(probe.is_system_resource("prebuilt-invoice"));
        assert!(!probe.is_system_resource("invoices-2024"));

        let disabled = ProbeConfig {
            system_resource_prefix: String::new(),
        };
        assert!(!disabled.is_system_resource("prebuilt-invoice"));
    }
}
