//! Chart Repository Management
//!
//! This crate provides the repository side of chartproxy:
//!
//! - **Registry**: Helm-compatible `repositories.yaml`, guarded by a
//!   cross-process lock file
//! - **Synchronization**: index download, validation and caching, one
//!   repository at a time or all of them concurrently
//! - **Search**: a unified index over every cached repository with
//!   score-based ranking and version constraint filtering
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chartproxy_repo::{Catalog, ChartQuery, HttpFetcher, Registry, RepoSettings, RepositoryEntry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = RepoSettings::from_default_paths()?;
//! let registry = Registry::new(settings, Arc::new(HttpFetcher::default()));
//!
//! // Add a repository; its index is downloaded before it is registered
//! registry
//!     .add(RepositoryEntry::new("bitnami", "https://charts.bitnami.com/bitnami"), false)
//!     .await?;
//!
//! // Search the cached indices
//! let catalog = Catalog::new(registry);
//! let query = ChartQuery {
//!     keyword: "nginx".to_string(),
//!     ..Default::default()
//! };
//! for chart in catalog.list_charts(&query).await? {
//!     println!("{} {}", chart.name, chart.version);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Notes
//!
//! - Credentials are NEVER sent after cross-origin redirects unless the
//!   repository sets `pass_credentials_all`
//! - A repository is only registered once its index has been fetched

pub mod cache;
pub mod catalog;
pub mod config;
pub mod constraint;
pub mod credentials;
pub mod error;
mod fsutil;
pub mod http;
pub mod index;
pub mod lock;
pub mod registry;
pub mod search;
pub mod settings;
pub mod sync;

#[cfg(test)]
mod testutil;

// Re-exports for convenience
pub use cache::RepositoryCache;
pub use catalog::{Catalog, ChartListing, ChartQuery, DEFAULT_VERSION_CONSTRAINT};
pub use config::{RepositoryEntry, RepositoryFile};
pub use constraint::{VersionConstraint, apply_constraint};
pub use credentials::{ScopedCredentials, TlsOptions};
pub use error::{RepoError, Result, SyncFailure};
pub use http::{HttpFetcher, IndexFetcher};
pub use index::{ChartIndex, ChartVersion};
pub use lock::RegistryLock;
pub use registry::Registry;
pub use search::{SEARCH_MAX_SCORE, SearchIndex, SearchResult, sort_by_score};
pub use settings::RepoSettings;
pub use sync::{Synchronizer, UpdateReport};
