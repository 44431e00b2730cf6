//! Error types for classhub-server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// No verifiable identity, or identity not registered (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Identity lacks the role or ownership required (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict with existing state (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// A chunked write stopped part way; committed chunks stay committed (500)
    #[error("Batch failed after {committed_chunks} of {total_chunks} chunks: {message}")]
    PartialFailure {
        committed_chunks: usize,
        total_chunks: usize,
        message: String,
    },

    /// Store error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// classhub-common error
    #[error("Common error: {0}")]
    Common(#[from] classhub_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut extra = serde_json::Map::new();

        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::PartialFailure {
                committed_chunks,
                total_chunks,
                message,
            } => {
                extra.insert("committedChunks".to_string(), json!(committed_chunks));
                extra.insert("totalChunks".to_string(), json!(total_chunks));
                (StatusCode::INTERNAL_SERVER_ERROR, "PARTIAL_FAILURE", message)
            }
            ApiError::Database(sqlx::Error::RowNotFound) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Record not found".to_string(),
            ),
            ApiError::Database(ref err) => {
                error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    err.to_string(),
                )
            }
            ApiError::Common(classhub_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(ref err) => {
                error!("Internal error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    err.to_string(),
                )
            }
        };

        let mut body = serde_json::Map::new();
        body.insert("code".to_string(), json!(error_code));
        body.insert("message".to_string(), json!(message));
        body.extend(extra);

        (status, Json(json!({ "error": body }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ApiError::Common(classhub_common::Error::InvalidInput("bad date".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Database(sqlx::Error::RowNotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Common(classhub_common::Error::Delivery("webhook down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_partial_failure_body_reports_progress() {
        let response = ApiError::PartialFailure {
            committed_chunks: 1,
            total_chunks: 3,
            message: "chunk 2 failed".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "PARTIAL_FAILURE");
        assert_eq!(body["error"]["committedChunks"], 1);
        assert_eq!(body["error"]["totalChunks"], 3);
        assert_eq!(body["error"]["message"], "chunk 2 failed");
    }
}
