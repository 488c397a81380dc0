//! Index fetching
//!
//! `IndexFetcher` is the seam between the synchronizer and the network.
//! `HttpFetcher` is the production implementation for Helm-style HTTP(S)
//! repositories serving `index.yaml`.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::config::RepositoryEntry;
use crate::credentials::{ScopedCredentials, TlsOptions};
use crate::error::{RepoError, Result};

const MAX_REDIRECTS: u32 = 10;

/// Downloads the raw index of a repository
#[async_trait]
pub trait IndexFetcher: Send + Sync {
    /// Fetch the raw `index.yaml` bytes of `entry`
    async fn fetch(&self, entry: &RepositoryEntry) -> Result<Vec<u8>>;
}

/// HTTP(S) index fetcher with redirect-safe credential handling
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            user_agent: format!("chartproxy/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    fn client_for(&self, entry: &RepositoryEntry) -> Result<reqwest::Client> {
        let builder = reqwest::Client::builder()
            // Redirects are followed by hand so credentials never leak cross-origin
            .redirect(reqwest::redirect::Policy::none())
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone());

        TlsOptions::for_entry(entry)
            .apply(builder)?
            .build()
            .map_err(|e| RepoError::transport(e.to_string()))
    }
}

#[async_trait]
impl IndexFetcher for HttpFetcher {
    async fn fetch(&self, entry: &RepositoryEntry) -> Result<Vec<u8>> {
        let client = self.client_for(entry)?;
        let credentials = ScopedCredentials::for_entry(entry);
        let mut current_url = entry.index_url()?;
        let mut redirects = 0;

        loop {
            let mut request = client.get(&current_url);
            if let Some(auth) = credentials.as_ref().and_then(|c| c.auth_header(&current_url)) {
                request = request.header(reqwest::header::AUTHORIZATION, auth);
            }

            tracing::debug!(repo = %entry.name, url = %current_url, "fetching index");
            let response = request.send().await?;
            let status = response.status();

            if status.is_redirection() {
                redirects += 1;
                if redirects > MAX_REDIRECTS {
                    return Err(RepoError::transport(format!(
                        "Too many redirects (max {})",
                        MAX_REDIRECTS
                    )));
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| RepoError::transport("Redirect without Location header"))?;

                let base = Url::parse(&current_url)?;
                current_url = base.join(location)?.to_string();
                continue;
            }

            if !status.is_success() {
                return Err(RepoError::transport(format!(
                    "failed to fetch {} : {}",
                    current_url, status
                )));
            }

            let bytes = response.bytes().await?;
            return Ok(bytes.to_vec());
        }
    }
}
