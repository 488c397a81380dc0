//! Chart listing across every configured repository

use serde::{Deserialize, Serialize};

use crate::constraint::VersionConstraint;
use crate::error::Result;
use crate::registry::Registry;
use crate::search::{SEARCH_MAX_SCORE, SearchIndex, SearchResult, sort_by_score};

/// Constraint applied when the caller gives none: any released version
pub const DEFAULT_VERSION_CONSTRAINT: &str = ">0.0.0";

/// Chart listing parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChartQuery {
    /// Search term; empty lists everything
    #[serde(default)]
    pub keyword: String,

    /// Version constraint
    #[serde(default)]
    pub version: String,

    /// List every matching version instead of the newest per chart
    #[serde(default)]
    pub all_versions: bool,

    /// Treat `keyword` as a regular expression
    #[serde(default)]
    pub regexp: bool,
}

/// One chart version as shown to clients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartListing {
    pub name: String,
    pub version: String,
    pub app_version: String,
    pub description: String,
    pub icon: String,
    pub tags: String,
}

impl From<SearchResult> for ChartListing {
    fn from(result: SearchResult) -> Self {
        let chart = result.chart;
        Self {
            name: result.name,
            version: chart.version,
            app_version: chart.app_version.unwrap_or_default(),
            description: chart.description.unwrap_or_default(),
            icon: chart.icon.unwrap_or_default(),
            tags: chart.tags.unwrap_or_default(),
        }
    }
}

/// Searches the cached indices of the registry's repositories
#[derive(Clone)]
pub struct Catalog {
    registry: Registry,
}

impl Catalog {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// List charts matching `query`, newest version first within a chart
    pub async fn list_charts(&self, query: &ChartQuery) -> Result<Vec<ChartListing>> {
        let version = if query.version.trim().is_empty() {
            DEFAULT_VERSION_CONSTRAINT
        } else {
            query.version.as_str()
        };
        let constraint = VersionConstraint::parse(version)?;

        let entries = self.registry.entries().await?;
        let index = SearchIndex::build(self.registry.cache(), &entries, version);

        let mut results = if query.keyword.is_empty() {
            index.all()
        } else if query.regexp {
            index.search_regex(&query.keyword, SEARCH_MAX_SCORE)?
        } else {
            index.search(&query.keyword, SEARCH_MAX_SCORE)
        };
        sort_by_score(&mut results);

        if let Some(constraint) = constraint {
            results = constraint.apply(results, query.all_versions);
        }
        tracing::debug!(keyword = %query.keyword, version, matches = results.len(), "listed charts");

        Ok(results.into_iter().map(ChartListing::from).collect())
    }
}
