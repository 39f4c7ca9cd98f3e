//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

use subman_core::ai::AiError;
use subman_core::monitor::{MonitorError, RepositoryError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    // Resource errors
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),

    // Validation errors
    #[error("validation error: {0}")]
    ValidationError(String),

    // Database errors
    #[error("database error: {0}")]
    DatabaseError(String),

    // External service errors
    #[error("external service error: {0}")]
    ExternalServiceError(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::NotFound(msg)
            | AppError::AlreadyExists(msg)
            | AppError::ValidationError(msg)
            | AppError::ServiceUnavailable(msg) => msg.as_str(),
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "Database error occurred"
            }
            AppError::ExternalServiceError(msg) => {
                tracing::error!("External service error: {}", msg);
                "External service error"
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::AlreadyExists(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() || db.is_check_violation() => {
                AppError::ValidationError(db.message().to_string())
            }
            _ => AppError::DatabaseError(err.to_string()),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => AppError::NotFound(format!("Subscription {} not found", id)),
            RepositoryError::Conflict(id) => AppError::AlreadyExists(format!("Subscription {} already exists", id)),
            RepositoryError::Invalid(msg) => AppError::ValidationError(msg),
            RepositoryError::Backend(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<MonitorError> for AppError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::InvalidArgument(msg) => AppError::ValidationError(msg),
        }
    }
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::NotConfigured => AppError::ServiceUnavailable("AI assistant is not configured".to_string()),
            AiError::InvalidInput(msg) => AppError::ValidationError(msg),
            other => AppError::ExternalServiceError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_map_to_http_status() {
        assert_eq!(AppError::from(RepositoryError::NotFound("x".into())).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(RepositoryError::Conflict("x".into())).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::from(RepositoryError::Invalid("x".into())).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(RepositoryError::Backend("x".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_monitor_misuse_is_bad_request() {
        let err = AppError::from(MonitorError::InvalidArgument("null batch".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_ai_errors_map_to_http_status() {
        assert_eq!(AppError::from(AiError::NotConfigured).status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppError::from(AiError::Server(500)).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::from(AiError::InvalidInput("x".into())).status_code(), StatusCode::BAD_REQUEST);
    }
}
