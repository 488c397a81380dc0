//! Repository registry service
//!
//! Owns the registry file. Every read and write happens while the
//! [`RegistryLock`] is held, so several proxies (or a `helm` CLI honoring
//! the same lock file) can share one `repositories.yaml`. Index downloads
//! happen outside the lock.

use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::RepositoryCache;
use crate::config::{RepositoryEntry, RepositoryFile};
use crate::error::{RepoError, Result};
use crate::http::IndexFetcher;
use crate::lock::RegistryLock;
use crate::settings::RepoSettings;
use crate::sync::{Synchronizer, UpdateReport};

/// Add, remove, list and refresh configured repositories
#[derive(Clone)]
pub struct Registry {
    settings: RepoSettings,
    synchronizer: Synchronizer,
}

impl Registry {
    pub fn new(settings: RepoSettings, fetcher: Arc<dyn IndexFetcher>) -> Self {
        let synchronizer = Synchronizer::new(
            fetcher,
            RepositoryCache::new(&settings.repository_cache),
            settings.sync_timeout,
        );
        Self {
            settings,
            synchronizer,
        }
    }

    pub fn settings(&self) -> &RepoSettings {
        &self.settings
    }

    pub fn cache(&self) -> &RepositoryCache {
        self.synchronizer.cache()
    }

    async fn lock(&self) -> Result<RegistryLock> {
        RegistryLock::acquire(
            &self.settings.lock_path(),
            self.settings.lock_timeout,
            self.settings.lock_retry_interval,
        )
        .await
    }

    /// Register a repository after downloading its index
    ///
    /// With `no_update` an existing name is rejected; otherwise the entry with
    /// the same name is replaced in place. A repository whose index cannot be
    /// fetched is never written to the registry.
    pub async fn add(&self, entry: RepositoryEntry, no_update: bool) -> Result<()> {
        entry.validate()?;

        if no_update {
            let _lock = self.lock().await?;
            let file = RepositoryFile::load_or_default(&self.settings.repository_config)?;
            if file.has(&entry.name) {
                return Err(RepoError::DuplicateName { name: entry.name });
            }
        }

        // The download runs without holding the lock
        if let Err(e) = self.synchronizer.sync(&entry).await {
            return Err(RepoError::UnreachableRepository {
                url: entry.url,
                source: Box::new(e),
            });
        }

        let _lock = self.lock().await?;
        let path = &self.settings.repository_config;
        let mut file = RepositoryFile::load_or_default(path)?;

        if no_update && file.has(&entry.name) {
            return Err(RepoError::DuplicateName { name: entry.name });
        }

        tracing::info!(repo = %entry.name, url = %entry.url, "repository added");
        file.update(entry);
        file.save_to(path)
    }

    /// Remove repositories and their cached indices
    ///
    /// All or nothing: if any name is unknown the registry is left untouched.
    /// Returns the removed names in request order.
    pub async fn remove(&self, names: &[String]) -> Result<Vec<String>> {
        if names.is_empty() || names.iter().any(|n| n.trim().is_empty()) {
            return Err(RepoError::input("repository name can not be empty"));
        }
        let mut seen = HashSet::new();
        let names: Vec<String> = names
            .iter()
            .filter(|n| seen.insert(n.as_str()))
            .cloned()
            .collect();

        let _lock = self.lock().await?;
        let path = &self.settings.repository_config;
        let mut file = self.load_non_empty()?;

        if let Some(missing) = names.iter().find(|n| !file.has(n)) {
            return Err(RepoError::NotFound {
                name: missing.clone(),
            });
        }
        for name in &names {
            file.remove(name);
        }
        file.save_to(path)?;

        for name in &names {
            self.cache().remove(name)?;
            tracing::info!(repo = %name, "repository removed");
        }
        Ok(names)
    }

    /// Configured repositories; `EmptyRegistry` when there are none
    pub async fn list(&self) -> Result<Vec<RepositoryEntry>> {
        let _lock = self.lock().await?;
        Ok(self.load_non_empty()?.repositories)
    }

    /// Configured repositories; an absent or empty registry yields no entries
    pub async fn entries(&self) -> Result<Vec<RepositoryEntry>> {
        let _lock = self.lock().await?;
        Ok(RepositoryFile::load_or_default(&self.settings.repository_config)?.repositories)
    }

    /// Refresh the cached index of every configured repository
    pub async fn update_all(&self) -> Result<UpdateReport> {
        let entries = self.entries().await?;
        Ok(self.synchronizer.update_all(entries).await)
    }

    fn load_non_empty(&self) -> Result<RepositoryFile> {
        let file = RepositoryFile::load_or_default(&self.settings.repository_config)?;
        if file.is_empty() {
            return Err(RepoError::EmptyRegistry);
        }
        Ok(file)
    }
}
