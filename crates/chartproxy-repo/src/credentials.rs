//! Credentials and TLS material for repository requests
//!
//! Key security features:
//! - Credentials are only sent to the origin of the repository URL
//! - Cross-origin redirects drop the Authorization header unless the
//!   repository opts into `pass_credentials_all`

use reqwest::ClientBuilder;
use url::Url;

use crate::config::RepositoryEntry;
use crate::error::{RepoError, Result};

/// Basic-auth credentials scoped to one repository origin
#[derive(Debug, Clone)]
pub struct ScopedCredentials {
    origin: String,
    username: String,
    password: String,
    pass_all: bool,
}

impl ScopedCredentials {
    /// Credentials for a repository entry, if it carries any
    pub fn for_entry(entry: &RepositoryEntry) -> Option<Self> {
        let (username, password) = entry.basic_auth()?;
        Some(Self {
            origin: entry.url.clone(),
            username: username.to_string(),
            password: password.to_string(),
            pass_all: entry.pass_credentials_all,
        })
    }

    /// Authorization header value for `url`, or `None` when the URL is
    /// outside the credential scope
    pub fn auth_header(&self, url: &str) -> Option<String> {
        if !self.pass_all && !same_origin(&self.origin, url) {
            tracing::warn!(
                "Cross-origin request from {} to {} - credentials not forwarded",
                self.origin,
                url
            );
            return None;
        }
        let encoded = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            format!("{}:{}", self.username, self.password),
        );
        Some(format!("Basic {}", encoded))
    }
}

/// Check if two URLs are same-origin (for redirect safety)
pub fn same_origin(url1: &str, url2: &str) -> bool {
    match (Url::parse(url1), Url::parse(url2)) {
        (Ok(u1), Ok(u2)) => {
            u1.scheme() == u2.scheme()
                && u1.host() == u2.host()
                && u1.port_or_known_default() == u2.port_or_known_default()
        }
        _ => false,
    }
}

/// TLS options of a repository entry
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    pub ca_file: Option<String>,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    pub fn for_entry(entry: &RepositoryEntry) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Self {
            ca_file: non_empty(&entry.ca_file),
            cert_file: non_empty(&entry.cert_file),
            key_file: non_empty(&entry.key_file),
            insecure_skip_verify: entry.insecure_skip_tls_verify,
        }
    }

    /// Configure a client builder with these options
    pub fn apply(&self, mut builder: ClientBuilder) -> Result<ClientBuilder> {
        if let Some(ca) = &self.ca_file {
            let pem = read_pem(ca, "CA file")?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| RepoError::transport(format!("invalid CA file {}: {}", ca, e)))?;
            builder = builder.add_root_certificate(cert);
        }

        match (&self.cert_file, &self.key_file) {
            (Some(cert), Some(key)) => {
                let mut pem = read_pem(cert, "certificate file")?;
                pem.push(b'\n');
                pem.extend(read_pem(key, "key file")?);
                let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                    RepoError::transport(format!("invalid client certificate {}: {}", cert, e))
                })?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(RepoError::transport(
                    "both certFile and keyFile are required for client certificates",
                ));
            }
        }

        if self.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        Ok(builder)
    }
}

fn read_pem(path: &str, what: &str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| RepoError::transport(format!("can't read {} {}: {}", what, path, e)))
}
