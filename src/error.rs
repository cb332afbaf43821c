//! Application error types and HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type covering every handler outcome that is not
/// a success.
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication and session errors
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid session token")]
    InvalidSession,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Input errors
    #[error("{message}")]
    Validation { field: String, message: String },

    // Resource errors
    #[error("{message}")]
    Conflict { resource: String, message: String },

    #[error("{0} not found")]
    NotFound(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// JSON error body: `{"error": {"code": ..., "message": ..., "field": ...}}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Error: {:?}", self);

        let (status, detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_CREDENTIALS", self.to_string()),
            ),
            AppError::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("SESSION_EXPIRED", self.to_string()),
            ),
            AppError::InvalidSession => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_SESSION", self.to_string()),
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone()),
            ),
            AppError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new("FORBIDDEN", message.clone()),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::Conflict { message, .. } => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", message.clone()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal error occurred"),
            ),
        };

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, field_errors)| {
                let message = field_errors
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid value".to_string());
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("input".to_string(), "Invalid value".to_string()));

        AppError::Validation { field, message }
    }
}

/// Convenience result type used throughout the application
pub type AppResult<T> = Result<T, AppError>;
