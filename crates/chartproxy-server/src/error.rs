//! API error type and its mapping onto the response envelope.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use chartproxy_repo::RepoError;
use thiserror::Error;

use crate::response::Envelope;

/// Error returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Repository operation failed.
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// Malformed request (body or query string).
    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        tracing::warn!("{}", message);
        Json(Envelope::error(message)).into_response()
    }
}
