//! HTTP-facing errors
//!
//! Maps domain failures onto status codes with a `{"error": ...}` body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;
use crate::service::ServiceError;

const INTERNAL_MESSAGE: &str = "internal server error";

// == App Error Enum ==
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed id, body or field
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    /// Detail is logged, never sent to the client
    #[error("{0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidId(_) => AppError::InvalidInput("invalid ad id".to_string()),
            ServiceError::InvalidInput(msg) => AppError::InvalidInput(msg),
            ServiceError::NotFound(_) => AppError::NotFound("ad not found".to_string()),
            ServiceError::Repository(err) => {
                error!(error = %err, "request failed");
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
            ),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_service_errors_map_to_status() {
        let cases = [
            (ServiceError::InvalidId(0), StatusCode::BAD_REQUEST),
            (
                ServiceError::InvalidInput("title cannot be empty".into()),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::NotFound(3), StatusCode::NOT_FOUND),
            (
                ServiceError::Repository(StoreError::from_persistence("deadlock")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_exposed() {
        let err = AppError::from(ServiceError::Repository(StoreError::from_persistence(
            "Access denied for user 'root'",
        )));
        let response = err.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], INTERNAL_MESSAGE);
    }
}
