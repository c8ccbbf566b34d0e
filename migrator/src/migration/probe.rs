//! Capability probing
//!
//! Each catalog version is tried against the instance's listing endpoint, oldest
//! first. Providers are backward- but not forward-compatible, so the newest
//! version that answered 200 wins.

use std::fmt;

use tracing::{debug, info, warn};

use crate::services::client::{
    ActiveContext, ApiVersionCapability, Credential, ManagementApi, OperationKind,
    ServiceInstance, VersionCatalog,
};
use crate::services::config::ProbeConfig;
use crate::services::errors::{MigrationError, MigrationResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Http(u16),
    /// No HTTP response at all
    Unreachable(String),
}

impl ProbeStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProbeStatus::Http(200))
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Http(status) => write!(f, "{}", status),
            ProbeStatus::Unreachable(_) => f.write_str("ERR"),
        }
    }
}

/// One probe attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityProbeResult {
    pub version: String,
    pub status: ProbeStatus,
    /// Non-system models listed, when the version answered
    pub resource_count: Option<usize>,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub instance: String,
    pub best: ApiVersionCapability,
    pub diagnostics: Vec<CapabilityProbeResult>,
}

impl ProbeReport {
    pub fn render_table(&self) -> String {
        let mut out = format!("Capability probe for {}\n", self.instance);
        out.push_str(&render_diagnostics(&self.diagnostics));
        out.push_str(&format!("Best supported version: {}\n", self.best.version));
        out
    }
}

pub fn render_diagnostics(rows: &[CapabilityProbeResult]) -> String {
    let version_width = rows
        .iter()
        .map(|row| row.version.len())
        .chain(std::iter::once("VERSION".len()))
        .max()
        .unwrap_or(0);

    let mut out = format!("{:<version_width$}  {:>6}  {:>6}  URL\n", "VERSION", "STATUS", "MODELS");
    for row in rows {
        let count = row
            .resource_count
            .map(|count| count.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<version_width$}  {:>6}  {:>6}  {}\n",
            row.version,
            row.status.to_string(),
            count,
            row.url
        ));
        if let ProbeStatus::Unreachable(reason) = &row.status {
            out.push_str(&format!("{:<version_width$}  ({})\n", "", reason));
        }
    }
    out
}

/// Find the newest catalog version the instance answers.
///
/// Every catalog entry yields one diagnostics row whatever its outcome; the
/// rows travel with the error when nothing answered.
pub async fn probe_best<A: ManagementApi + ?Sized>(
    api: &A,
    ctx: &ActiveContext,
    instance: &ServiceInstance,
    credential: &Credential,
    catalog: &VersionCatalog,
    probe: &ProbeConfig,
) -> MigrationResult<ProbeReport> {
    info!(
        "Probing {} against {} API versions",
        instance,
        catalog.len()
    );

    let mut diagnostics = Vec::with_capacity(catalog.len());
    let mut best: Option<&ApiVersionCapability> = None;

    for capability in catalog.iter() {
        let url = capability.url(&instance.base_url, OperationKind::List, None);

        let row = match api.list_resources(ctx, instance, credential, capability).await {
            Ok(resources) => {
                let count = resources
                    .iter()
                    .filter(|r| !probe.is_system_resource(&r.resource_id))
                    .count();
                debug!("{} answered {} with {} models", instance, capability.version, count);
                best = Some(capability);
                CapabilityProbeResult {
                    version: capability.version.to_string(),
                    status: ProbeStatus::Http(200),
                    resource_count: Some(count),
                    url,
                }
            }
            Err(e) => {
                debug!("{} rejected {}: {}", instance, capability.version, e);
                let status = match e.status() {
                    Some(status) => ProbeStatus::Http(status),
                    None => ProbeStatus::Unreachable(e.to_string()),
                };
                CapabilityProbeResult {
                    version: capability.version.to_string(),
                    status,
                    resource_count: None,
                    url,
                }
            }
        };
        diagnostics.push(row);
    }

    match best {
        Some(best) => {
            info!("{} supports API version {}", instance, best.version);
            Ok(ProbeReport {
                instance: instance.to_string(),
                best: best.clone(),
                diagnostics,
            })
        }
        None => {
            warn!(
                "{} answered none of the probed API versions:\n{}",
                instance,
                render_diagnostics(&diagnostics)
            );
            Err(MigrationError::NoCapableVersion {
                instance: instance.to_string(),
                diagnostics,
            })
        }
    }
}
