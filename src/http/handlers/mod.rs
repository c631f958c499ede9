pub mod control;
pub mod sessions;
pub mod upload;
pub mod ws;

use super::error::ApiError;
use axum::{http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::{Map, Value};

// ============================================================================
// Response Types
// ============================================================================

/// `{status, message, file_path?}` body shared by upload, control and errors
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok",
            message: message.into(),
            file_path: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            file_path: None,
        }
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub status: &'static str,
    pub count: usize,
    pub sessions: Vec<Map<String, Value>>,
}

// ============================================================================
// Shared Handlers
// ============================================================================

/// Fallback for any method a route does not accept
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
