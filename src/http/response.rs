//! Response envelopes and error mapping.
//!
//! # Responsibilities
//! - Wrap successful payloads as `{code, message, data?}`
//! - Wrap failures as `{code, error}` with a matching HTTP status
//! - Provide the JSON fallback for unmatched routes
//!
//! # Design Decisions
//! - Error codes are stable snake_case strings; messages are free text
//! - Unknown failures map to `internal_error` / 500

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub error: String,
}

/// Build a success envelope carrying `data`.
pub fn success<T: Serialize>(code: &str, message: impl Into<String>, data: T) -> Json<SuccessResponse<T>> {
    Json(SuccessResponse {
        code: code.to_string(),
        message: message.into(),
        data: Some(data),
    })
}

/// Build a success envelope without data.
pub fn acknowledge(code: &str, message: impl Into<String>) -> Json<SuccessResponse<()>> {
    Json(SuccessResponse {
        code: code.to_string(),
        message: message.into(),
        data: None,
    })
}

/// Application errors surfaced by handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Internal(_)) {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            code: self.code(),
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Fallback for requests that match no route.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("the requested resource was not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_statuses() {
        let cases = [
            (ApiError::BadRequest("x".into()), "bad_request", 400),
            (ApiError::NotFound("x".into()), "not_found", 404),
            (ApiError::Conflict("x".into()), "conflict", 409),
            (ApiError::Validation("x".into()), "validation_error", 422),
            (ApiError::Internal("x".into()), "internal_error", 500),
        ];
        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status().as_u16(), status);
        }
    }

    #[test]
    fn acknowledge_omits_data() {
        let Json(body) = acknowledge("WELCOME_000", "hello");
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value, serde_json::json!({"code": "WELCOME_000", "message": "hello"}));
    }

    #[test]
    fn success_includes_data() {
        let Json(body) = success("USERS_FETCHED", "users retrieved", vec![1, 2]);
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["data"], serde_json::json!([1, 2]));
    }
}
