//! Unified search index over every cached repository
//!
//! Each chart version becomes one searchable line made of four fields
//! separated by a vertical tab:
//!
//! ```text
//! chart \v repo/chart \v description \v keywords
//! ```
//!
//! The score of a match is the index of the field it starts in, so a hit
//! on the chart name (0) ranks above a hit on a keyword (3).

use regex::Regex;
use std::collections::BTreeMap;

use crate::cache::RepositoryCache;
use crate::config::RepositoryEntry;
use crate::error::{RepoError, Result};
use crate::index::{ChartIndex, ChartVersion, compare_versions};

/// Highest score a search result may have
pub const SEARCH_MAX_SCORE: usize = 25;

const SEP: &str = "\u{000B}";

/// A chart version matched by a search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// `repo/chart`
    pub name: String,
    pub chart: ChartVersion,
    pub score: usize,
}

#[derive(Debug, Clone)]
struct IndexedChart {
    name: String,
    line: String,
    chart: ChartVersion,
}

/// Searchable view of many repository indices
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    charts: BTreeMap<String, IndexedChart>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from the cached indices of `entries`
    ///
    /// A non-empty `version` adds every chart version so that a version
    /// constraint can be applied afterwards; otherwise only the newest
    /// version of each chart is indexed. Repositories whose cache is missing
    /// or corrupt are skipped.
    pub fn build(cache: &RepositoryCache, entries: &[RepositoryEntry], version: &str) -> Self {
        let mut index = Self::new();
        for entry in entries {
            match cache.load(&entry.name) {
                Ok(repo_index) => index.add_repo(&entry.name, &repo_index, !version.is_empty()),
                Err(e) => {
                    tracing::warn!(
                        repo = %entry.name,
                        "repo {:?} is corrupt or missing, try updating repositories: {}",
                        entry.name,
                        e
                    );
                }
            }
        }
        index
    }

    /// Add one repository's charts
    pub fn add_repo(&mut self, repo: &str, index: &ChartIndex, all_versions: bool) {
        for (chart_name, versions) in &index.entries {
            let name = format!("{}/{}", repo, chart_name);
            if all_versions {
                for version in versions {
                    let key = format!("{}:{}", name, version.version);
                    self.insert(key, &name, version);
                }
            } else if let Some(latest) = versions.first() {
                self.insert(name.clone(), &name, latest);
            }
        }
    }

    fn insert(&mut self, key: String, name: &str, chart: &ChartVersion) {
        let keywords = chart.keywords.join(" ");
        let line = [
            chart.name.as_str(),
            name,
            chart.description.as_deref().unwrap_or_default(),
            keywords.as_str(),
        ]
        .join(SEP);
        self.charts.insert(
            key,
            IndexedChart {
                name: name.to_string(),
                line,
                chart: chart.clone(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Every indexed chart version, score 0
    pub fn all(&self) -> Vec<SearchResult> {
        self.charts
            .values()
            .map(|c| SearchResult {
                name: c.name.clone(),
                chart: c.chart.clone(),
                score: 0,
            })
            .collect()
    }

    /// Case-insensitive literal search
    pub fn search(&self, term: &str, max_score: usize) -> Vec<SearchResult> {
        let term = term.to_lowercase();
        self.collect(max_score, |c| {
            let line = c.line.to_lowercase();
            line.find(&term).map(|pos| field_index(&line, pos))
        })
    }

    /// Regular-expression search with the same scoring as [`search`](Self::search)
    pub fn search_regex(&self, pattern: &str, max_score: usize) -> Result<Vec<SearchResult>> {
        let re = Regex::new(pattern).map_err(|e| {
            RepoError::input(format!("invalid regular expression {:?}: {}", pattern, e))
        })?;
        Ok(self.collect(max_score, |c| {
            re.find(&c.line).map(|m| field_index(&c.line, m.start()))
        }))
    }

    fn collect<F>(&self, max_score: usize, score_of: F) -> Vec<SearchResult>
    where
        F: Fn(&IndexedChart) -> Option<usize>,
    {
        self.charts
            .values()
            .filter_map(|c| {
                let score = score_of(c)?;
                (score <= max_score).then(|| SearchResult {
                    name: c.name.clone(),
                    chart: c.chart.clone(),
                    score,
                })
            })
            .collect()
    }
}

/// Index of the separator-delimited field containing byte offset `pos`
fn field_index(line: &str, pos: usize) -> usize {
    line[..pos].matches(SEP).count()
}

/// Order results by score, then name; equal names newest version first
pub fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        a.score
            .cmp(&b.score)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| compare_versions(&b.chart.version, &a.chart.version))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::SAMPLE_INDEX;
    use tempfile::TempDir;

    fn sample_index() -> SearchIndex {
        let mut index = SearchIndex::new();
        index.add_repo("stable", &ChartIndex::from_yaml(SAMPLE_INDEX).unwrap(), false);
        index
    }

    #[test]
    fn test_latest_only() {
        let index = sample_index();
        assert_eq!(index.len(), 2);

        let all = index.all();
        let nginx = all.iter().find(|r| r.name == "stable/nginx").unwrap();
        assert_eq!(nginx.chart.version, "1.2.0");
        assert!(all.iter().all(|r| r.score == 0));
    }

    #[test]
    fn test_all_versions() {
        let mut index = SearchIndex::new();
        index.add_repo("stable", &ChartIndex::from_yaml(SAMPLE_INDEX).unwrap(), true);
        assert_eq!(index.len(), 3);

        let names: Vec<_> = index.all().into_iter().map(|r| r.name).collect();
        assert_eq!(names.iter().filter(|n| *n == "stable/nginx").count(), 2);
    }

    #[test]
    fn test_same_chart_in_two_repos() {
        let parsed = ChartIndex::from_yaml(SAMPLE_INDEX).unwrap();
        let mut index = SearchIndex::new();
        index.add_repo("a", &parsed, false);
        index.add_repo("b", &parsed, false);

        let results = index.search("nginx", SEARCH_MAX_SCORE);
        let mut names: Vec<_> = results.into_iter().map(|r| r.name).collect();
        names.sort();
        assert_eq!(names, vec!["a/nginx", "b/nginx"]);
    }

    #[test]
    fn test_search_scores_by_field() {
        let index = sample_index();

        let hits = index.search("NGINX", SEARCH_MAX_SCORE);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 0);

        let hits = index.search("database", SEARCH_MAX_SCORE);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "stable/redis");
        assert_eq!(hits[0].score, 2);

        let hits = index.search("webserver", SEARCH_MAX_SCORE);
        assert_eq!(hits[0].score, 3);

        let hits = index.search("stable/", SEARCH_MAX_SCORE);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|r| r.score == 1));
    }

    #[test]
    fn test_search_max_score() {
        let index = sample_index();
        assert!(index.search("webserver", 2).is_empty());
        assert!(index.search("no-such-chart", SEARCH_MAX_SCORE).is_empty());
    }

    #[test]
    fn test_search_regex() {
        let index = sample_index();
        let hits = index.search_regex("^red", SEARCH_MAX_SCORE).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "stable/redis");

        let err = index.search_regex("(unclosed", SEARCH_MAX_SCORE).unwrap_err();
        assert!(matches!(err, RepoError::InvalidInput { .. }));
    }

    #[test]
    fn test_sort_by_score() {
        let mut index = SearchIndex::new();
        index.add_repo("stable", &ChartIndex::from_yaml(SAMPLE_INDEX).unwrap(), true);

        let mut results = index.search("e", SEARCH_MAX_SCORE);
        sort_by_score(&mut results);

        let order: Vec<_> = results
            .iter()
            .map(|r| (r.score, r.name.as_str(), r.chart.version.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, "stable/redis", "17.0.0"),
                (1, "stable/nginx", "1.2.0"),
                (1, "stable/nginx", "1.0.0"),
            ]
        );
    }

    #[test]
    fn test_build_skips_missing_cache() {
        let tmp = TempDir::new().unwrap();
        let cache = RepositoryCache::new(tmp.path());
        let parsed = ChartIndex::from_yaml(SAMPLE_INDEX).unwrap();
        cache.store("stable", SAMPLE_INDEX.as_bytes(), &parsed).unwrap();
        std::fs::write(cache.index_path("broken"), "not: [an index").unwrap();

        let entries = vec![
            RepositoryEntry::new("stable", "https://example.com/charts"),
            RepositoryEntry::new("broken", "https://broken.example.com"),
            RepositoryEntry::new("never-synced", "https://new.example.com"),
        ];

        let latest = SearchIndex::build(&cache, &entries, "");
        assert_eq!(latest.len(), 2);

        let versions = SearchIndex::build(&cache, &entries, ">0.0.0");
        assert_eq!(versions.len(), 3);
    }
}
