//! API error types with HTTP response mapping.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ErrorKind};
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),

    /// Workflow error, mapped by its kind.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    /// HTTP status and error kind name for the error.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Domain(err) => {
                let kind = err.kind();
                let status = match kind {
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::InvalidTransition | ErrorKind::ConcurrentModification => {
                        StatusCode::CONFLICT
                    }
                    ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorKind::IntegrityViolation => StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorKind::PersistenceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, kind.as_str())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, kind, "request failed");
        }

        let body = axum::Json(serde_json::json!({ "error": message, "kind": kind }));
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return (status, [(header::RETRY_AFTER, "1")], body).into_response();
        }
        (status, body).into_response()
    }
}
