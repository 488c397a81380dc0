//! Index synchronization
//!
//! Downloads repository indices through an [`IndexFetcher`], validates them
//! and stores them in the [`RepositoryCache`]. `update_all` refreshes every
//! repository concurrently, one task per repository.

use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::RepositoryCache;
use crate::config::RepositoryEntry;
use crate::error::{RepoError, Result, SyncFailure};
use crate::http::IndexFetcher;
use crate::index::ChartIndex;

/// Refreshes cached repository indices
#[derive(Clone)]
pub struct Synchronizer {
    fetcher: Arc<dyn IndexFetcher>,
    cache: RepositoryCache,
    timeout: Duration,
}

impl Synchronizer {
    pub fn new(fetcher: Arc<dyn IndexFetcher>, cache: RepositoryCache, timeout: Duration) -> Self {
        Self {
            fetcher,
            cache,
            timeout,
        }
    }

    pub fn cache(&self) -> &RepositoryCache {
        &self.cache
    }

    /// Download, validate and cache the index of one repository
    ///
    /// Returns the path of the cached index file.
    pub async fn sync(&self, entry: &RepositoryEntry) -> Result<PathBuf> {
        let raw = match tokio::time::timeout(self.timeout, self.fetcher.fetch(entry)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(RepoError::Transport { message })) => {
                return Err(RepoError::Unreachable {
                    name: entry.name.clone(),
                    message,
                });
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(RepoError::Unreachable {
                    name: entry.name.clone(),
                    message: format!("timed out after {:?}", self.timeout),
                });
            }
        };

        let index = ChartIndex::from_bytes(&raw)?;
        let path = self.cache.store(&entry.name, &raw, &index)?;
        tracing::info!(repo = %entry.name, charts = index.entries.len(), "index updated");
        Ok(path)
    }

    /// Refresh every repository concurrently and collect the outcome
    pub async fn update_all(&self, entries: Vec<RepositoryEntry>) -> UpdateReport {
        let (names, tasks): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .map(|entry| {
                let this = self.clone();
                let name = entry.name.clone();
                let task = tokio::spawn(async move { this.sync(&entry).await });
                (name, task)
            })
            .unzip();

        let mut report = UpdateReport::default();
        for (name, outcome) in names.into_iter().zip(join_all(tasks).await) {
            match outcome {
                Ok(Ok(_)) => report.updated.push(name),
                Ok(Err(e)) => {
                    tracing::warn!(repo = %name, "failed to update index: {}", e);
                    report.failures.push(SyncFailure {
                        name,
                        error: e.to_string(),
                    });
                }
                Err(join_err) => {
                    tracing::error!(repo = %name, "update task failed: {}", join_err);
                    report.failures.push(SyncFailure {
                        name,
                        error: format!("update task failed: {}", join_err),
                    });
                }
            }
        }
        report
    }
}

/// Outcome of a bulk index update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Repositories whose cache was refreshed
    pub updated: Vec<String>,
    /// Repositories that could not be refreshed
    pub failures: Vec<SyncFailure>,
}

impl UpdateReport {
    /// `UpdateFailed` when at least one repository failed
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.failures.is_empty() {
            Ok(self.updated)
        } else {
            Err(RepoError::UpdateFailed {
                failures: self.failures,
            })
        }
    }
}
