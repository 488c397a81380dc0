//! Repository settings
//!
//! All paths and timeouts used by the registry, the synchronizer and the
//! search index. Built once at startup and handed to each component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RepoError, Result};

/// Default budget for acquiring the registry lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay between two lock attempts
pub const DEFAULT_LOCK_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Default bound on a single repository index download
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(120);

/// Paths and timeouts shared by the repository components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSettings {
    /// Registry file (`repositories.yaml`)
    pub repository_config: PathBuf,

    /// Directory holding the per-repository index caches
    pub repository_cache: PathBuf,

    /// Overall budget for acquiring the registry lock
    pub lock_timeout: Duration,

    /// Delay between lock attempts
    pub lock_retry_interval: Duration,

    /// Bound on a single index download
    pub sync_timeout: Duration,
}

impl RepoSettings {
    /// Settings rooted at explicit paths, default timeouts
    pub fn new(repository_config: impl Into<PathBuf>, repository_cache: impl Into<PathBuf>) -> Self {
        Self {
            repository_config: repository_config.into(),
            repository_cache: repository_cache.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_retry_interval: DEFAULT_LOCK_RETRY_INTERVAL,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }

    /// Settings using the Helm-compatible default locations
    pub fn from_default_paths() -> Result<Self> {
        Ok(Self::new(
            Self::default_repository_config()?,
            Self::default_repository_cache()?,
        ))
    }

    /// `<config dir>/helm/repositories.yaml`
    pub fn default_repository_config() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("helm").join("repositories.yaml"))
    }

    /// `<cache dir>/helm/repository`
    pub fn default_repository_cache() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine cache directory".to_string(),
        })?;
        Ok(cache_dir.join("helm").join("repository"))
    }

    /// Lock file guarding the registry: same base name, `.lock` extension
    pub fn lock_path(&self) -> PathBuf {
        lock_path_for(&self.repository_config)
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration, retry_interval: Duration) -> Self {
        self.lock_timeout = timeout;
        self.lock_retry_interval = retry_interval;
        self
    }

    #[must_use]
    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }
}

fn lock_path_for(config: &Path) -> PathBuf {
    config.with_extension("lock")
}
