//! Error responses for the web UI.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::FileshareError;

/// Error categories surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad request (400), e.g. a missing or stale CSRF token.
    BadRequest,
    /// Forbidden (403).
    Forbidden,
    /// Not found (404).
    NotFound,
    /// Conflict (409).
    Conflict,
    /// Payload too large (413).
    PayloadTooLarge,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Web error type.
///
/// The body is always the generic status text; `detail` is for logs only.
#[derive(Debug)]
pub struct WebError {
    code: ErrorCode,
    detail: String,
}

impl WebError {
    /// Create a new error.
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, detail)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, detail)
    }

    pub fn payload_too_large(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, detail)
    }

    /// Create an internal error; logged when turned into a response.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, detail)
    }

    /// Error category.
    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        if self.code == ErrorCode::InternalError {
            tracing::error!("Internal error: {}", self.detail);
        } else {
            tracing::debug!("{}: {}", status, self.detail);
        }
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.detail)
    }
}

impl std::error::Error for WebError {}

impl From<FileshareError> for WebError {
    fn from(err: FileshareError) -> Self {
        match &err {
            FileshareError::NotFound(msg) => WebError::not_found(format!("{msg} not found")),
            FileshareError::Validation(msg) => WebError::bad_request(msg.clone()),
            FileshareError::Permission(msg) => WebError::forbidden(msg.clone()),
            FileshareError::DuplicateEmail => {
                WebError::new(ErrorCode::Conflict, "duplicate email")
            }
            _ => WebError::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status() {
        assert_eq!(ErrorCode::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ErrorCode::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_domain_error() {
        let err: WebError = FileshareError::NotFound("file".into()).into();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err: WebError = FileshareError::Permission("nope".into()).into();
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let err: WebError = FileshareError::DuplicateEmail.into();
        assert_eq!(err.code(), ErrorCode::Conflict);

        let err: WebError = FileshareError::Mail("relay down".into()).into();
        assert_eq!(err.code(), ErrorCode::InternalError);

        let err: WebError = FileshareError::Database("locked".into()).into();
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[tokio::test]
    async fn test_internal_body_is_generic() {
        let response = WebError::internal("secret detail").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"Internal Server Error");
    }
}
