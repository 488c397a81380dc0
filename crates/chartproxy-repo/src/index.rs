//! Chart repository index types
//!
//! Helm-compatible `index.yaml` format

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{RepoError, Result};

/// Repository index (Helm-compatible)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartIndex {
    /// API version
    #[serde(default)]
    pub api_version: String,

    /// When this index was generated
    #[serde(default)]
    pub generated: Option<DateTime<Utc>>,

    /// Chart versions by chart name
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<ChartVersion>>,
}

impl ChartIndex {
    /// Parse index from bytes
    ///
    /// Chart versions without a name or version are dropped, and every
    /// version list is sorted newest first.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let yaml = std::str::from_utf8(bytes).map_err(|e| RepoError::CorruptIndex {
            message: format!("Invalid UTF-8: {}", e),
        })?;
        Self::from_yaml(yaml)
    }

    /// Parse index from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut index: Self = serde_yaml::from_str(yaml).map_err(|e| RepoError::CorruptIndex {
            message: e.to_string(),
        })?;

        if index.api_version.is_empty() {
            return Err(RepoError::CorruptIndex {
                message: "no API version specified".to_string(),
            });
        }

        for (name, versions) in index.entries.iter_mut() {
            versions.retain(|v| {
                let valid = !v.name.is_empty() && !v.version.is_empty();
                if !valid {
                    tracing::warn!(chart = %name, version = %v.version, "skipping invalid chart version in index");
                }
                valid
            });
        }
        index.entries.retain(|_, versions| !versions.is_empty());
        index.sort_entries();

        Ok(index)
    }

    /// Load and parse an index file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Sort every version list newest first
    pub fn sort_entries(&mut self) {
        for versions in self.entries.values_mut() {
            versions.sort_by(|a, b| compare_versions(&b.version, &a.version));
        }
    }

    /// Chart names in lexical order
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }
}

/// One chart version in the index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartVersion {
    /// Chart name
    #[serde(default)]
    pub name: String,

    /// Chart version (semver)
    #[serde(default)]
    pub version: String,

    /// Application version
    #[serde(default)]
    pub app_version: Option<String>,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Home URL
    #[serde(default)]
    pub home: Option<String>,

    /// Icon URL
    #[serde(default)]
    pub icon: Option<String>,

    /// Keywords for search
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Comma separated tags
    #[serde(default)]
    pub tags: Option<String>,

    /// URLs to download the chart archive
    #[serde(default)]
    pub urls: Vec<String>,

    /// Digest of the archive
    #[serde(default)]
    pub digest: Option<String>,

    /// Creation timestamp
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    /// Deprecated flag
    #[serde(default)]
    pub deprecated: bool,

    /// Chart API version
    #[serde(default)]
    pub api_version: Option<String>,

    /// Chart type (application or library)
    #[serde(default)]
    pub r#type: Option<String>,
}

/// Parse a chart version, tolerating a leading `v` and a missing minor or
/// patch component (`1.2` reads as `1.2.0`)
pub fn parse_version(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if let Ok(v) = Version::parse(trimmed) {
        return Some(v);
    }

    let split = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() >= 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let padded = format!("{}{}{}", core, ".0".repeat(3 - parts.len()), suffix);
    Version::parse(&padded).ok()
}

/// Order two version strings; semver versions sort above unparseable ones
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}
