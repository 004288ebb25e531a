//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::ServiceError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (malformed path/query values)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Business-rule failure from the service layer
    Service(ServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Service(err) => service_error_response(err),
        };

        (status, Json(error)).into_response()
    }
}

fn service_error_response(err: ServiceError) -> (StatusCode, ApiError) {
    let message = err.to_string();
    match err {
        ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message)),
        ServiceError::RoomNotFound(_) => {
            (StatusCode::NOT_FOUND, ApiError::new("ROOM_NOT_FOUND", message))
        }
        ServiceError::SlotsNotFound => {
            (StatusCode::NOT_FOUND, ApiError::new("SLOTS_NOT_FOUND", message))
        }
        ServiceError::RoomRequired => {
            (StatusCode::BAD_REQUEST, ApiError::new("ROOM_REQUIRED", message))
        }
        ServiceError::ScheduleConflict { .. } => {
            (StatusCode::CONFLICT, ApiError::new("SCHEDULE_CONFLICT", message))
        }
        ServiceError::Repository(repo_err) => match repo_err {
            RepositoryError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("REPOSITORY_ERROR", message),
            ),
        },
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Service(ServiceError::Repository(err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
