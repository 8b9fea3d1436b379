//! Error handling for the shop directory service
//!
//! Every failure becomes one JSON envelope: `{"error": {code, message, fields?}}`.
//! Store, timeout and composition failures share a single opaque message so
//! that query text and arguments never reach the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::discovery::ComposerError;
use shared::validation::ValidationErrors;
use thiserror::Error;

const SERVER_ERROR_MESSAGE: &str =
    "The server encountered an error and could not process your request";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    FailedValidation(ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Discovery execution errors
    #[error("Query composition failed: {0}")]
    QueryComposition(#[from] ComposerError),

    #[error("Query exceeded its time limit")]
    QueryTimeout,

    #[error("Row decode failed: {0}")]
    RowDecode(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::FailedValidation(errors)
    }
}

impl AppError {
    /// Map a unique-violation to `Conflict`, anything else to `DatabaseError`
    pub fn from_write(err: sqlx::Error, conflict_message: &str) -> Self {
        if let Some(db) = err.as_database_error() {
            if db.code().as_deref() == Some("23505") {
                return AppError::Conflict(conflict_message.to_string());
            }
        }
        AppError::DatabaseError(err)
    }

    /// Errors that are the server's fault rather than the caller's
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AppError::QueryComposition(_)
                | AppError::QueryTimeout
                | AppError::RowDecode(_)
                | AppError::DatabaseError(_)
                | AppError::Internal(_)
        )
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            fields: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid email or password"),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired"),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token"),
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    "You do not have permission to perform this action",
                ),
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone()),
            ),
            AppError::FailedValidation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: "One or more fields are invalid".to_string(),
                    fields: Some(errors.clone()),
                },
            ),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", message.clone()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::QueryComposition(_)
            | AppError::QueryTimeout
            | AppError::RowDecode(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", SERVER_ERROR_MESSAGE),
            ),
        };

        if self.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_422() {
        let response =
            AppError::FailedValidation(ValidationErrors::single("sort", "invalid sort value"))
                .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_execution_failures_are_opaque() {
        for error in [
            AppError::QueryTimeout,
            AppError::RowDecode("bad approval status".into()),
            AppError::Internal("SELECT secret FROM shops".into()),
        ] {
            assert!(error.is_server_error());
            assert_eq!(
                error.into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[test]
    fn test_not_found_is_client_error() {
        let error = AppError::NotFound("Shop".into());
        assert!(!error.is_server_error());
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }
}
