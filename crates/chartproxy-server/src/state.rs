//! Shared application state type.

use chartproxy_repo::{Catalog, IndexFetcher, Registry, RepoSettings};
use std::sync::Arc;

/// Services needed by the API handlers.
pub struct AppContext {
    pub registry: Registry,
    pub catalog: Catalog,
    /// Whether the server runs with debug logging
    pub debug: bool,
}

/// Application state shared across all handlers.
pub type AppState = Arc<AppContext>;

impl AppContext {
    pub fn new(settings: RepoSettings, fetcher: Arc<dyn IndexFetcher>, debug: bool) -> Self {
        let registry = Registry::new(settings, fetcher);
        let catalog = Catalog::new(registry.clone());
        Self {
            registry,
            catalog,
            debug,
        }
    }

    pub fn settings(&self) -> &RepoSettings {
        self.registry.settings()
    }
}
