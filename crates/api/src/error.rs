//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid bearer token.
    Unauthorized(String),
    /// Authenticated but lacking the required role.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::EmptyCart
        | DomainError::MissingField(_)
        | DomainError::InvalidQuantity { .. }
        | DomainError::InvalidPrice(_)
        | DomainError::InsufficientStock { .. }
        | DomainError::TotalMismatch { .. }
        | DomainError::InvalidStatus(_)
        | DomainError::UserExists
        | DomainError::UsernameTaken
        | DomainError::EmailTaken
        | DomainError::UsernameTooShort { .. }
        | DomainError::PasswordTooShort { .. }
        | DomainError::InvalidCredentials => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::ProductNotFound(_)
        | DomainError::OrderNotFound(_)
        | DomainError::UserNotFound
        | DomainError::NotInCart(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::PasswordHash(_) | DomainError::Store(_) => {
            tracing::error!(error = %err, "request failed in the store");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
