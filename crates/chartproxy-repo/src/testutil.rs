//! Shared fixtures for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::RepositoryEntry;
use crate::error::{RepoError, Result};
use crate::http::IndexFetcher;

pub(crate) const SAMPLE_INDEX: &str = r#"apiVersion: v1
generated: "2024-01-01T00:00:00Z"
entries:
  nginx:
    - name: nginx
      version: 1.0.0
      appVersion: 1.24.0
      description: NGINX web server
      keywords:
        - webserver
        - http
      urls:
        - https://example.com/charts/nginx-1.0.0.tgz
    - name: nginx
      version: 1.2.0
      appVersion: 1.25.0
      description: NGINX web server
      icon: https://example.com/nginx.png
      tags: web,proxy
      keywords:
        - webserver
        - http
      urls:
        - https://example.com/charts/nginx-1.2.0.tgz
  redis:
    - name: redis
      version: 17.0.0
      appVersion: 7.0.0
      description: Redis database
      keywords:
        - cache
        - database
      urls:
        - https://example.com/charts/redis-17.0.0.tgz
"#;

/// In-memory fetcher keyed by repository name
#[derive(Default)]
pub(crate) struct StubFetcher {
    responses: Mutex<HashMap<String, std::result::Result<Vec<u8>, String>>>,
    delay: Option<Duration>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_index(self, repo: &str, body: &str) -> Self {
        self.set_index(repo, body);
        self
    }

    pub(crate) fn with_failure(self, repo: &str, message: &str) -> Self {
        self.lock()
            .insert(repo.to_string(), Err(message.to_string()));
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_delay_for(mut self, repo: &str, delay: Duration) -> Self {
        self.delays.insert(repo.to_string(), delay);
        self
    }

    pub(crate) fn set_index(&self, repo: &str, body: &str) {
        self.lock()
            .insert(repo.to_string(), Ok(body.as_bytes().to_vec()));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, std::result::Result<Vec<u8>, String>>> {
        self.responses.lock().unwrap()
    }
}

#[async_trait]
impl IndexFetcher for StubFetcher {
    async fn fetch(&self, entry: &RepositoryEntry) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&entry.name).copied().or(self.delay) {
            tokio::time::sleep(delay).await;
        }
        let response = self.lock().get(&entry.name).cloned();
        match response {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(message)) => Err(RepoError::transport(message)),
            None => Err(RepoError::transport(format!(
                "failed to fetch {}/index.yaml : 404 Not Found",
                entry.url
            ))),
        }
    }
}
