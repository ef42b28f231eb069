//! Unified error handling for the donation service
//!
//! One error taxonomy crosses the service boundary: validation problems are
//! shown verbatim, everything sensitive (gateway responses, signature
//! mismatches) is logged server-side and replaced with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error codes for client handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,
    #[serde(rename = "GATEWAY_ERROR")]
    GatewayError,
    #[serde(rename = "SIGNATURE_ERROR")]
    SignatureError,
    #[serde(rename = "UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "SERVICE_UNAVAILABLE")]
    ServiceUnavailable,
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

/// Unified application error type
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Bad input or business-rule violation; the message is user-correctable
    /// and shown verbatim.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Gateway credentials missing or incomplete; operator-correctable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Upstream gateway HTTP failure. The detail is logged, never shown.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Authenticity check failed. The detail is logged; callers always get
    /// the same generic message to avoid oracle behaviour.
    #[error("signature verification failed: {0}")]
    Signature(String),

    /// Missing or invalid credentials on a guarded route.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Transient backend failure; the caller may retry.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Signature(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Configuration(_) => ErrorCode::ConfigurationError,
            AppError::Gateway(_) => ErrorCode::GatewayError,
            AppError::Signature(_) => ErrorCode::SignatureError,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Unavailable(_) => ErrorCode::ServiceUnavailable,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Sanitized message shown to the caller
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(message) => message.clone(),
            AppError::NotFound { entity, id } => format!("{} '{}' not found", entity, id),
            AppError::Configuration(_) => {
                "Payment gateway is not configured. Please contact the site operator".to_string()
            }
            AppError::Gateway(_) => {
                "Failed to create payment order. Please try again.".to_string()
            }
            AppError::Signature(_) => "Payment verification failed".to_string(),
            AppError::Unauthorized(_) => "Authentication required".to_string(),
            AppError::Unavailable(_) => {
                "Service temporarily unavailable. Please try again later".to_string()
            }
            AppError::Internal(_) => {
                "An internal server error occurred. Please try again later".to_string()
            }
        }
    }
}

/// Standardized error response structure returned to clients for all
/// error cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: ErrorCode,

    /// Human-readable (sanitized) error message
    pub message: String,

    /// ISO 8601 timestamp of the error
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError) -> Self {
        Self {
            error: error.error_code(),
            message: error.user_message(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        // Full detail stays server-side; the response body carries the
        // sanitized message only.
        if status_code.is_server_error() {
            tracing::error!(error = %self, status = %status_code.as_u16(), "Server error occurred");
        } else {
            tracing::warn!(error = %self, status = %status_code.as_u16(), "Client error occurred");
        }

        let error_response = ErrorResponse::from_app_error(&self);
        (status_code, Json(error_response)).into_response()
    }
}

impl From<crate::database::error::DatabaseError> for AppError {
    fn from(err: crate::database::error::DatabaseError) -> Self {
        if err.is_retryable() {
            AppError::Unavailable(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl From<crate::gateway::error::GatewayError> for AppError {
    fn from(err: crate::gateway::error::GatewayError) -> Self {
        match err {
            crate::gateway::error::GatewayError::Validation { message } => {
                AppError::Validation(message)
            }
            other => AppError::Gateway(other.to_string()),
        }
    }
}

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_shown_verbatim() {
        let error = AppError::validation("Minimum donation amount is 100");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.error_code(), ErrorCode::ValidationError);
        assert_eq!(error.user_message(), "Minimum donation amount is 100");
    }

    #[test]
    fn gateway_detail_is_never_shown() {
        let error = AppError::Gateway("HTTP 401: {\"error\":\"bad key\"}".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!error.user_message().contains("bad key"));
        assert!(error.user_message().contains("try again"));
    }

    #[test]
    fn signature_error_is_generic() {
        let error = AppError::Signature("expected abc, got def".to_string());
        assert_eq!(error.user_message(), "Payment verification failed");
        assert!(!error.user_message().contains("abc"));
    }

    #[test]
    fn unauthorized_is_generic() {
        let error = AppError::Unauthorized("missing bearer token".to_string());
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(error.user_message(), "Authentication required");
    }

    #[test]
    fn retryable_database_errors_surface_as_unavailable() {
        use crate::database::error::{DatabaseError, DatabaseErrorKind};

        let error: AppError = DatabaseError::new(DatabaseErrorKind::Connection {
            message: "pool timed out".to_string(),
        })
        .into();
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let error: AppError = DatabaseError::new(DatabaseErrorKind::Unknown {
            message: "syntax error".to_string(),
        })
        .into();
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_mapping() {
        let error = AppError::not_found("Campaign", "1234");
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert!(error.user_message().contains("Campaign"));
    }
}
