//! Repository registry file
//!
//! Helm-compatible `repositories.yaml`: an ordered list of named chart
//! repositories with their credentials and TLS options.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::error::{RepoError, Result};
use crate::fsutil;

/// Registry file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFile {
    /// API version
    #[serde(default)]
    pub api_version: String,

    /// When this file was first generated
    #[serde(default)]
    pub generated: Option<DateTime<Utc>>,

    /// Configured repositories, in insertion order
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

impl RepositoryFile {
    /// Fresh, empty registry
    pub fn new() -> Self {
        Self {
            api_version: "v1".to_string(),
            generated: Some(Utc::now()),
            repositories: Vec::new(),
        }
    }

    /// Load the registry from a path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the registry, treating a missing file as an empty registry
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn from_yaml(content: &str) -> Result<Self> {
        // An empty file is a valid, empty registry
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let file: Self = serde_yaml::from_str(content)?;
        Ok(file)
    }

    /// Atomically write the registry to a path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fsutil::write_atomic(path, content.as_bytes())
    }

    /// Whether a repository with this name exists
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get a repository by name
    pub fn get(&self, name: &str) -> Option<&RepositoryEntry> {
        self.repositories.iter().find(|r| r.name == name)
    }

    /// Replace the entry with the same name in place, or append it
    pub fn update(&mut self, entry: RepositoryEntry) {
        match self.repositories.iter_mut().find(|r| r.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.repositories.push(entry),
        }
    }

    /// Remove a repository by name
    pub fn remove(&mut self, name: &str) -> Option<RepositoryEntry> {
        let idx = self.repositories.iter().position(|r| r.name == name)?;
        Some(self.repositories.remove(idx))
    }

    /// List all repository names
    pub fn names(&self) -> Vec<&str> {
        self.repositories.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

/// Repository definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryEntry {
    /// Unique name for this repository
    pub name: String,

    /// Repository base URL; the index lives at `<url>/index.yaml`
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Client certificate (PEM) for mutual TLS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<String>,

    /// Client key (PEM) for mutual TLS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,

    /// CA bundle used to verify the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<String>,

    /// Skip TLS verification (insecure)
    #[serde(default, rename = "insecure_skip_tls_verify")]
    pub insecure_skip_tls_verify: bool,

    /// Forward credentials to every host, including redirect targets
    #[serde(default, rename = "pass_credentials_all")]
    pub pass_credentials_all: bool,
}

impl RepositoryEntry {
    /// Create a public repository entry
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Attach basic-auth credentials
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Check the entry before anything touches the disk or the network
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(RepoError::input("repository name can not be empty"));
        }
        if self.name.contains('/') || self.name.contains(',') {
            return Err(RepoError::input(format!(
                "repository name {:?} must not contain '/' or ','",
                self.name
            )));
        }
        self.parsed_url()?;

        let has_username = self.username.as_deref().is_some_and(|u| !u.is_empty());
        let has_password = self.password.as_deref().is_some_and(|p| !p.is_empty());
        if has_username && !has_password {
            return Err(RepoError::MissingPassword);
        }
        Ok(())
    }

    fn parsed_url(&self) -> Result<Url> {
        let url = Url::parse(&self.url).map_err(|e| RepoError::InvalidRepositoryUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(RepoError::InvalidRepositoryUrl {
                url: self.url.clone(),
                reason: format!("unsupported scheme {:?}, expected http or https", other),
            }),
        }
    }

    /// URL of the repository index file
    pub fn index_url(&self) -> Result<String> {
        let mut url = self.parsed_url()?;
        let path = format!("{}/index.yaml", url.path().trim_end_matches('/'));
        url.set_path(&path);
        Ok(url.to_string())
    }

    /// Basic-auth pair, if both halves are present
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}
