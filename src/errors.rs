use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("role directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Directory(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        let error = match &self {
            AppError::NotFound(_) => "not_found",
            AppError::Configuration(_) => "configuration",
            AppError::Directory(_) => "directory",
            AppError::Internal(_) => "internal",
        };

        let payload = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(payload)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

/// Failures raised by a [`RoleDirectory`](crate::authz::RoleDirectory) backend.
///
/// The authorization engine never surfaces these to callers; they are logged
/// and folded into the less-privileged outcome.
#[derive(thiserror::Error, Debug)]
pub enum DirectoryError {
    #[error("role directory unavailable: {0}")]
    Unavailable(String),
    #[error("role directory query timed out after {0:?}")]
    Timeout(Duration),
    #[error("role directory query failed")]
    Database(#[from] sqlx::Error),
}

impl DirectoryError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
