//! API version catalog
//!
//! Versions are date-coded (`2023-07-31`, `2024-02-29-preview`). Ordering uses the
//! parsed date prefix only, so identifiers of different lengths still compare
//! chronologically.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use thiserror::Error;

const DATE_PREFIX_LEN: usize = 10;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("API version '{value}' does not start with a YYYY-MM-DD date")]
pub struct VersionParseError {
    pub value: String,
}

/// A date-coded API version identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiVersion {
    raw: String,
    date: NaiveDate,
}

impl ApiVersion {
    pub fn parse(raw: &str) -> Result<Self, VersionParseError> {
        let raw = raw.trim();
        let invalid = || VersionParseError {
            value: raw.to_string(),
        };

        let prefix = raw.get(..DATE_PREFIX_LEN).ok_or_else(invalid)?;
        let suffix = &raw[DATE_PREFIX_LEN..];
        if !(suffix.is_empty() || suffix.starts_with('-')) {
            return Err(invalid());
        }

        let date = NaiveDate::parse_from_str(prefix, "%Y-%m-%d").map_err(|_| invalid())?;
        Ok(Self {
            raw: raw.to_string(),
            date,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Strictly newer by release date
    pub fn is_newer_than(&self, other: &ApiVersion) -> bool {
        self.date > other.date
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ApiVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Operation categories that have their own path per version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    List,
    Authorize,
    Copy,
    Delete,
}

/// One catalog entry: a version plus the paths it serves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersionCapability {
    pub version: ApiVersion,
    pub list_path: String,
    pub authorize_path: String,
    /// Contains an `{id}` placeholder
    pub copy_path: String,
    /// Contains an `{id}` placeholder
    pub delete_path: String,
}

impl ApiVersionCapability {
    pub fn new(version: ApiVersion, root: &str) -> Self {
        Self {
            version,
            list_path: root.to_string(),
            authorize_path: format!("{}:authorizeCopy", root),
            copy_path: format!("{}/{{id}}:copyTo", root),
            delete_path: format!("{}/{{id}}", root),
        }
    }

    pub fn path(&self, kind: OperationKind, resource_id: Option<&str>) -> String {
        let template = match kind {
            OperationKind::List => &self.list_path,
            OperationKind::Authorize => &self.authorize_path,
            OperationKind::Copy => &self.copy_path,
            OperationKind::Delete => &self.delete_path,
        };
        match resource_id {
            Some(id) => template.replace("{id}", id),
            None => template.clone(),
        }
    }

    /// Absolute URL for `kind` against an instance base URL
    pub fn url(&self, base_url: &str, kind: OperationKind, resource_id: Option<&str>) -> String {
        format!(
            "{}{}?api-version={}",
            base_url.trim_end_matches('/'),
            self.path(kind, resource_id),
            self.version
        )
    }
}

/// Versions known to this tool, ordered oldest to newest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCatalog {
    entries: Vec<ApiVersionCapability>,
}

impl VersionCatalog {
    pub fn new(mut entries: Vec<ApiVersionCapability>) -> Self {
        entries.sort_by(|a, b| a.version.cmp(&b.version));
        entries.dedup_by(|a, b| a.version == b.version);
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApiVersionCapability> {
        self.entries.iter()
    }

    pub fn get(&self, version: &ApiVersion) -> Option<&ApiVersionCapability> {
        self.entries.iter().find(|entry| &entry.version == version)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const LEGACY_ROOT: &str = "/formrecognizer/documentModels";
const CURRENT_ROOT: &str = "/documentintelligence/documentModels";

const KNOWN_VERSIONS: &[(&str, &str)] = &[
    ("2022-08-31", LEGACY_ROOT),
    ("2023-07-31", LEGACY_ROOT),
    ("2024-02-29-preview", CURRENT_ROOT),
    ("2024-07-31-preview", CURRENT_ROOT),
    ("2024-11-30", CURRENT_ROOT),
];

static DEFAULT_CATALOG: OnceLock<VersionCatalog> = OnceLock::new();

/// Process-wide catalog of the versions this tool knows how to address
pub fn default_catalog() -> &'static VersionCatalog {
    DEFAULT_CATALOG.get_or_init(|| {
        VersionCatalog::new(
            KNOWN_VERSIONS
                .iter()
                .filter_map(|(version, root)| {
                    ApiVersion::parse(version)
                        .ok()
                        .map(|version| ApiVersionCapability::new(version, root))
                })
                .collect(),
        )
    })
}
