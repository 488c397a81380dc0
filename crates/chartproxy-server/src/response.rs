//! Response envelope shared by every API endpoint.
//!
//! Every reply is HTTP 200 with a JSON body `{"code": 0|1, "data"?, "error"?}`;
//! clients branch on `code`, not on the status line.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Success code
pub const CODE_OK: u8 = 0;

/// Failure code
pub const CODE_ERROR: u8 = 1;

/// JSON body of every API reply.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: CODE_ERROR,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Successful API reply.
#[derive(Debug)]
pub struct ApiResponse<T> {
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { data: Some(data) }
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn empty() -> Self {
        Self { data: None }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(Envelope {
            code: CODE_OK,
            data: self.data,
            error: None,
        })
        .into_response()
    }
}
