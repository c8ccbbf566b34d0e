//! TOML run file describing one migration
//!
//! ```toml
//! signed_in_domains = ["contoso.example", "fabrikam.example"]
//! resources = ["invoices", "receipts"]
//!
//! [source]
//! domain = "contoso.example"
//! subaccount = "prod"
//! resource_group = "docs-rg"
//! account_name = "docs-east"
//! base_url = "https://docs-east.example.com"
//! key = { env = "SOURCE_KEY" }
//!
//! [destination]
//! # same fields as [source]
//!
//! [settings.poll]
//! interval_ms = 1000
//! ```

use std::path::Path;

use serde::Deserialize;

use super::MigrationConfig;
use crate::services::client::{KeySource, ServiceInstance, StaticCredentialResolver};
use crate::services::errors::{MigrationError, MigrationResult};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct InstanceSpec {
    #[serde(flatten)]
    pub instance: ServiceInstance,
    #[serde(default)]
    pub key: Option<KeySource>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RunFile {
    pub source: InstanceSpec,
    pub destination: InstanceSpec,
    /// Domains the operator currently holds a session in
    #[serde(default)]
    pub signed_in_domains: Vec<String>,
    /// Model ids to migrate; empty means every non-system model at the source
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub settings: MigrationConfig,
}

impl RunFile {
    pub fn load(path: &Path) -> MigrationResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| MigrationError::Configuration {
            field: "run_file".to_string(),
            value: format!("{}: {}", path.display(), e),
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> MigrationResult<Self> {
        let run: RunFile = toml::from_str(text).map_err(|e| MigrationError::Configuration {
            field: "run_file".to_string(),
            value: e.to_string(),
        })?;
        run.validate()?;
        Ok(run)
    }

    pub fn validate(&self) -> MigrationResult<()> {
        for (field, entry) in [("source", &self.source), ("destination", &self.destination)] {
            let url = entry.instance.base_url.as_str();
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(MigrationError::Configuration {
                    field: format!("{}.base_url", field),
                    value: url.to_string(),
                });
            }
        }

        if self.source.instance == self.destination.instance {
            return Err(MigrationError::Configuration {
                field: "destination".to_string(),
                value: "same instance as source".to_string(),
            });
        }

        self.settings.validate()
    }

    /// Resolver over the keys declared in the file
    pub fn credential_resolver(&self) -> StaticCredentialResolver {
        [&self.source, &self.destination]
            .into_iter()
            .fold(StaticCredentialResolver::new(), |resolver, entry| {
                match &entry.key {
                    Some(key) => resolver.with_key(&entry.instance, key.clone()),
                    None => resolver,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::client::CredentialResolver;

    const RUN_FILE: &str = r#"
signed_in_domains = ["contoso.example", "fabrikam.example"]
resources = ["invoices"]

[source]
domain = "contoso.example"
subaccount = "prod"
resource_group = "docs-rg"
account_name = "docs-east"
base_url = "https://docs-east.example.com"
key = { inline = "source-key" }

[destination]
domain = "fabrikam.example"
subaccount = "shared"
resource_group = "ml-rg"
account_name = "docs-west"
base_url = "https://docs-west.example.com"
key = { env = "MODEL_MIGRATOR_TEST_DEST_KEY_UNSET" }

[settings.poll]
interval_ms = 250
"#;

    #[test]
    fn test_parse_run_file() {
        let run = RunFile::parse(RUN_FILE).unwrap();
        assert_eq!(run.source.instance.account_name, "docs-east");
        assert_eq!(run.destination.instance.domain, "fabrikam.example");
        assert_eq!(run.resources, vec!["invoices".to_string()]);
        assert_eq!(run.settings.poll.interval_ms, 250);
        // Unset sections keep their defaults.
        assert_eq!(run.settings.poll.max_attempts, 3600);
        assert_eq!(run.settings.probe.system_resource_prefix, "prebuilt-");
    }

    #[tokio::test]
    async fn test_credential_resolver_from_run_file() {
        let run = RunFile::parse(RUN_FILE).unwrap();
        let resolver = run.credential_resolver();

        let source = resolver.resolve(&run.source.instance).await.unwrap();
        assert_eq!(source.api_key(), "source-key");
        assert!(resolver.resolve(&run.destination.instance).await.is_err());
    }

    #[test]
    fn test_rejects_same_source_and_destination() {
        let west = "fabrikam.example\"\nsubaccount = \"shared\"\nresource_group = \"ml-rg\"\n\
                    account_name = \"docs-west\"\nbase_url = \"https://docs-west.example.com\"";
        let east = "contoso.example\"\nsubaccount = \"prod\"\nresource_group = \"docs-rg\"\n\
                    account_name = \"docs-east\"\nbase_url = \"https://docs-east.example.com\"";
        let text = RUN_FILE.replace(west, east);
        assert!(matches!(
            RunFile::parse(&text),
            Err(MigrationError::Configuration { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let text = RUN_FILE.replace("https://docs-west.example.com", "docs-west.example.com");
        match RunFile::parse(&text) {
            Err(MigrationError::Configuration { field, .. }) => {
                assert_eq!(field, "destination.base_url")
            }
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }
}
