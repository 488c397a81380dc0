//! Proxy configuration file
//!
//! ```yaml
//! repositoryConfig: /etc/chartproxy/repositories.yaml
//! repositoryCache: /var/cache/chartproxy
//! lockTimeout: 30s
//! lockRetryInterval: 1s
//! syncTimeout: 2m
//! cors:
//!   allowedOrigins: ["https://dashboard.example.com"]
//! repositories:
//!   - name: bitnami
//!     url: https://charts.bitnami.com/bitnami
//! ```

use chartproxy_repo::settings::{
    DEFAULT_LOCK_RETRY_INTERVAL, DEFAULT_LOCK_TIMEOUT, DEFAULT_SYNC_TIMEOUT,
};
use chartproxy_repo::{RepoSettings, RepositoryEntry};
use miette::Diagnostic;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(chartproxy::config::read))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    #[diagnostic(code(chartproxy::config::parse))]
    Parse { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(chartproxy::config::invalid))]
    Invalid {
        message: String,
        #[help]
        help: Option<String>,
    },
}

/// Cross-origin policy of the HTTP API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfig {
    AllowAll,
    AllowOrigins(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsSection {
    /// Allowed origins; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Contents of the proxy configuration file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Registry file; overridden by `--repository-config`
    #[serde(default)]
    pub repository_config: Option<PathBuf>,

    /// Index cache directory; overridden by `--repository-cache`
    #[serde(default)]
    pub repository_cache: Option<PathBuf>,

    /// Budget for acquiring the registry lock (default: 30s)
    #[serde(default = "default_lock_timeout", with = "humantime_serde")]
    pub lock_timeout: Duration,

    /// Delay between lock attempts (default: 1s)
    #[serde(default = "default_lock_retry_interval", with = "humantime_serde")]
    pub lock_retry_interval: Duration,

    /// Bound on one index download (default: 2m)
    #[serde(default = "default_sync_timeout", with = "humantime_serde")]
    pub sync_timeout: Duration,

    #[serde(default)]
    pub cors: CorsSection,

    /// Repositories added (or refreshed) at startup
    #[serde(default, alias = "helmRepos")]
    pub repositories: Vec<RepositoryEntry>,
}

fn default_lock_timeout() -> Duration {
    DEFAULT_LOCK_TIMEOUT
}

fn default_lock_retry_interval() -> Duration {
    DEFAULT_LOCK_RETRY_INTERVAL
}

fn default_sync_timeout() -> Duration {
    DEFAULT_SYNC_TIMEOUT
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            repository_config: None,
            repository_cache: None,
            lock_timeout: default_lock_timeout(),
            lock_retry_interval: default_lock_retry_interval(),
            sync_timeout: default_sync_timeout(),
            cors: CorsSection::default(),
            repositories: Vec::new(),
        }
    }
}

impl ProxyConfig {
    /// Parse configuration from YAML
    pub fn from_yaml(yaml: &str, path: &Path) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file that must exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content, path)
    }

    /// Load a configuration file, falling back to defaults when it is absent
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_retry_interval.is_zero() {
            return Err(ConfigError::Invalid {
                message: "lockRetryInterval must be greater than zero".to_string(),
                help: Some("use a value such as 1s or 500ms".to_string()),
            });
        }
        if self.sync_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                message: "syncTimeout must be greater than zero".to_string(),
                help: None,
            });
        }
        for entry in &self.repositories {
            entry.validate().map_err(|e| ConfigError::Invalid {
                message: format!("repository {:?}: {}", entry.name, e),
                help: None,
            })?;
        }
        Ok(())
    }

    /// Repository settings, explicit paths taking precedence over the file
    pub fn repo_settings(
        &self,
        repository_config: Option<PathBuf>,
        repository_cache: Option<PathBuf>,
    ) -> Result<RepoSettings, ConfigError> {
        let invalid = |e: chartproxy_repo::RepoError| ConfigError::Invalid {
            message: e.to_string(),
            help: Some("set --repository-config and --repository-cache explicitly".to_string()),
        };

        let config_path = match repository_config.or_else(|| self.repository_config.clone()) {
            Some(path) => path,
            None => RepoSettings::default_repository_config().map_err(invalid)?,
        };
        let cache_path = match repository_cache.or_else(|| self.repository_cache.clone()) {
            Some(path) => path,
            None => RepoSettings::default_repository_cache().map_err(invalid)?,
        };

        Ok(RepoSettings::new(config_path, cache_path)
            .with_lock_timeout(self.lock_timeout, self.lock_retry_interval)
            .with_sync_timeout(self.sync_timeout))
    }

    pub fn cors_config(&self) -> CorsConfig {
        if self.cors.allowed_origins.is_empty() {
            CorsConfig::AllowAll
        } else {
            CorsConfig::AllowOrigins(self.cors.allowed_origins.clone())
        }
    }
}
