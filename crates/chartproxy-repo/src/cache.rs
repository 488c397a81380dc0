//! On-disk index cache
//!
//! One `<name>-index.yaml` (raw downloaded index) and one `<name>-charts.txt`
//! (chart names, one per line) per repository, Helm-compatible layout.
//! Writes go through a temporary file and a rename.

use std::path::PathBuf;

use crate::error::Result;
use crate::fsutil;
use crate::index::ChartIndex;

/// Per-repository index cache rooted at a directory
#[derive(Debug, Clone)]
pub struct RepositoryCache {
    root: PathBuf,
}

impl RepositoryCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a repository's cached index file
    pub fn index_path(&self, repo_name: &str) -> PathBuf {
        self.root.join(format!("{}-index.yaml", repo_name))
    }

    /// Path of a repository's chart-name list
    pub fn charts_path(&self, repo_name: &str) -> PathBuf {
        self.root.join(format!("{}-charts.txt", repo_name))
    }

    /// Store a freshly downloaded index. `raw` is written verbatim so that an
    /// unchanged remote index yields a byte-identical cache file.
    pub fn store(&self, repo_name: &str, raw: &[u8], index: &ChartIndex) -> Result<PathBuf> {
        let mut charts = String::new();
        for name in index.names() {
            charts.push_str(name);
            charts.push('\n');
        }
        fsutil::write_atomic(&self.charts_path(repo_name), charts.as_bytes())?;

        let path = self.index_path(repo_name);
        fsutil::write_atomic(&path, raw)?;
        Ok(path)
    }

    /// Load and parse a repository's cached index
    pub fn load(&self, repo_name: &str) -> Result<ChartIndex> {
        ChartIndex::load(&self.index_path(repo_name))
    }

    /// Whether an index is cached for the repository
    pub fn contains(&self, repo_name: &str) -> bool {
        self.index_path(repo_name).is_file()
    }

    /// Delete a repository's cache files; missing files are not an error
    pub fn remove(&self, repo_name: &str) -> Result<()> {
        fsutil::remove_if_exists(&self.charts_path(repo_name))?;
        if fsutil::remove_if_exists(&self.index_path(repo_name))? {
            tracing::debug!(repo = %repo_name, "removed cached index");
        }
        Ok(())
    }
}
