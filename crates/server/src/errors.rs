use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use store::StoreError;
use tracing::{error, warn};

use crate::observability::REQUEST_ERRORS_TOTAL;

/// JSON error body returned by every kv endpoint: `{"error": ..., "detail": ...}`.
#[derive(Debug, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &'static str, detail: Option<String>) -> Self {
        Self { status, error, detail }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(detail.into()))
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", Some(detail.into()))
    }
}

impl From<StoreError> for JsonApiError {
    fn from(e: StoreError) -> Self {
        let (status, error) = match e {
            StoreError::InvalidKey(_) => (StatusCode::BAD_REQUEST, "Invalid Key"),
            StoreError::StorageFull => (StatusCode::INSUFFICIENT_STORAGE, "Storage Full"),
            StoreError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage Failure"),
        };
        Self::new(status, error, Some(e.to_string()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        REQUEST_ERRORS_TOTAL.inc();
        if self.status.is_server_error() {
            error!(status = %self.status, error = self.error, detail = ?self.detail, "request failed");
        } else if self.status != StatusCode::NOT_FOUND {
            warn!(status = %self.status, error = self.error, detail = ?self.detail, "request rejected");
        }
        (self.status, Json(self)).into_response()
    }
}
