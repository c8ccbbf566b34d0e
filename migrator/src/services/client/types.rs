use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One deployed endpoint of the provider's service
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceInstance {
    /// Administrative domain (tenant) that owns the instance
    pub domain: String,
    pub subaccount: String,
    pub resource_group: String,
    pub account_name: String,
    pub base_url: String,
}

impl ServiceInstance {
    /// Stable identity used for credential caching and reports
    pub fn id(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.domain, self.subaccount, self.resource_group, self.account_name
        )
    }
}

impl fmt::Display for ServiceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{})",
            self.account_name, self.domain, self.subaccount
        )
    }
}

/// API key for one instance
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    api_key: String,
}

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Model entry from a listing response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceSummary {
    #[serde(rename = "modelId")]
    pub resource_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "apiVersion", default)]
    pub api_version: Option<String>,
    #[serde(rename = "createdDateTime", default)]
    pub created_date_time: Option<String>,
}

/// Paged listing response
#[derive(Deserialize, Debug, Clone)]
pub struct ListResourcesResponse {
    #[serde(default)]
    pub value: Vec<ResourceSummary>,
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

/// Body sent to the destination's authorize-copy endpoint
#[derive(Serialize, Debug, Clone)]
pub struct AuthorizeCopyRequest<'a> {
    #[serde(rename = "modelId")]
    pub resource_id: &'a str,
    pub description: &'a str,
}

/// Opaque authorization issued by the destination for one transfer
///
/// The payload is kept as the exact bytes the destination returned and is
/// forwarded to the source without re-serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferAuthorization {
    pub resource_id: String,
    pub payload: Bytes,
}

/// Pollable reference to an in-flight copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub url: String,
}

/// Provider error object
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProviderError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub innererror: Option<serde_json::Value>,
}

impl ProviderError {
    pub fn detail(&self) -> String {
        let mut detail = match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => format!("{}: {}", self.code, self.message),
            (false, true) => self.code.clone(),
            _ => self.message.clone(),
        };
        if let Some(inner) = &self.innererror {
            detail.push_str(&format!(" ({})", inner));
        }
        detail
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProviderErrorBody {
    pub error: ProviderError,
}

/// Progress report for a copy operation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OperationStatus {
    pub status: String,
    #[serde(rename = "percentCompleted", default)]
    pub percent_completed: Option<u32>,
    #[serde(default)]
    pub error: Option<ProviderError>,
}

impl OperationStatus {
    pub fn is_complete(&self) -> bool {
        self.percent_completed == Some(100)
    }

    /// Provider gave up on the operation before reaching 100%
    pub fn is_failed(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "failed" | "canceled" | "cancelled"
        )
    }
}
