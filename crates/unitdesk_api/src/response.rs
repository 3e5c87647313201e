//! Response envelope.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

pub use axum::http::StatusCode;

/// Status plus optional JSON body. `body == None` means an empty response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    /// `{ "error": message }`.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "error": message.into() }))
    }

    /// The `error` string of an error body, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.body.as_ref()?.get("error")?.as_str()
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}
