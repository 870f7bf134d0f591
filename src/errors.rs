// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// Each variant maps to an HTTP status code and a stable error code
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Duplicate value: {0}. Please use another value")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Internal server error")]
    InternalError,

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Too many requests from this IP, please try again later")]
    RateLimitExceeded,
}

impl ApiError {
    /// Standard message for requests without a usable token
    pub fn not_logged_in() -> Self {
        ApiError::Unauthorized("You are not logged in! Please log in to get access".to_string())
    }

    fn code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::AlreadyExists(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            ApiError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::ExternalApiError(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR"),
            ApiError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
        }
    }
}

/// Convert ApiError to HTTP response
/// Operational errors keep their message; unexpected database failures are
/// reported to the client as a generic 500
impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = self.code();

        // Database internals never leak to API consumers
        let message = match self {
            ApiError::DatabaseError(_) => "Something went very wrong".to_string(),
            other => other.to_string(),
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.code().0
    }
}

/// Classify driver errors into operational variants where the cause is a
/// client mistake (duplicate key, missing row); everything else is a 500
impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => ApiError::NotFound("Document".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                let constraint = db.constraint().unwrap_or("unique field").to_string();
                ApiError::AlreadyExists(constraint)
            }
            _ => {
                log::error!("Database error: {}", e);
                ApiError::DatabaseError(e.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_variants() {
        assert_eq!(
            ApiError::NotFound("Tour".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::AlreadyExists("users_email_key".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Unauthorized("nope".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::ExternalApiError("checkout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn database_message_is_masked() {
        let resp = ApiError::DatabaseError("connection refused".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
