//! Cross-process lock around the registry file
//!
//! Key features:
//! - Advisory exclusive lock on a sibling `.lock` file
//! - Bounded acquisition (overall budget, fixed retry interval)
//! - Released when the guard is dropped, on every exit path

use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{RepoError, Result};

/// Held registry lock; dropping it releases the lock
#[derive(Debug)]
pub struct RegistryLock {
    file: File,
    path: PathBuf,
}

impl RegistryLock {
    /// Acquire the lock at `path`, retrying every `retry_interval` until
    /// `timeout` has elapsed.
    pub async fn acquire(path: &Path, timeout: Duration, retry_interval: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "acquired registry lock");
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == fs4::lock_contended_error().kind() => {}
                Err(e) => return Err(e.into()),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(RepoError::LockTimeout {
                    path: path.display().to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(retry_interval.min(deadline - now)).await;
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), "failed to release registry lock: {}", e);
        }
    }
}
