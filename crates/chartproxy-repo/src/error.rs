//! Error types for repository operations

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Repository operation errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Registry Errors ============
    #[error("repository name ({name}) already exists, please specify a different name")]
    DuplicateName { name: String },

    #[error("missing password")]
    MissingPassword,

    #[error("looks like {url:?} is not a valid chart repository or cannot be reached: {source}")]
    UnreachableRepository {
        url: String,
        #[source]
        source: Box<RepoError>,
    },

    #[error("no repo named {name:?} found")]
    NotFound { name: String },

    #[error("no repositories configured")]
    EmptyRegistry,

    #[error("timed out after {timeout:?} waiting for lock {path}")]
    LockTimeout { path: String, timeout: Duration },

    // ============ Input Errors ============
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("invalid repository URL {url:?}: {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ============ Index Errors ============
    #[error("corrupt index: {message}")]
    CorruptIndex { message: String },

    #[error("an invalid version/constraint format {constraint:?}: {message}")]
    InvalidConstraint { constraint: String, message: String },

    // ============ Network Errors ============
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("repository {name:?} is unreachable: {message}")]
    Unreachable { name: String, message: String },

    #[error("error list: {}", format_failures(.failures))]
    UpdateFailed { failures: Vec<SyncFailure> },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

/// One repository that failed during a bulk index update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub name: String,
    pub error: String,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}

fn format_failures(failures: &[SyncFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RepoError {
    /// Create an input error
    pub fn input(message: impl Into<String>) -> Self {
        RepoError::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        RepoError::Transport {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RepoError::transport(format!("request timed out: {}", e))
        } else if e.is_connect() {
            RepoError::transport(format!("connection failed: {}", e))
        } else if let Some(status) = e.status() {
            RepoError::transport(format!("HTTP {}: {}", status.as_u16(), e))
        } else {
            RepoError::transport(e.to_string())
        }
    }
}

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for RepoError {
    fn from(e: url::ParseError) -> Self {
        RepoError::InvalidRepositoryUrl {
            url: String::new(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_failed_message_lists_every_repository() {
        let err = RepoError::UpdateFailed {
            failures: vec![
                SyncFailure {
                    name: "a".to_string(),
                    error: "boom".to_string(),
                },
                SyncFailure {
                    name: "b".to_string(),
                    error: "down".to_string(),
                },
            ],
        };
        assert_eq!(err.to_string(), "error list: a: boom; b: down");
    }

    #[test]
    fn test_unreachable_repository_keeps_cause() {
        let err = RepoError::UnreachableRepository {
            url: "https://example.com/charts".to_string(),
            source: Box::new(RepoError::CorruptIndex {
                message: "no API version specified".to_string(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/charts"));
        assert!(msg.contains("no API version specified"));
    }
}
