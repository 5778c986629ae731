//! Error types for fileshare.

use thiserror::Error;

/// Common error type for fileshare.
#[derive(Error, Debug)]
pub enum FileshareError {
    /// Database error.
    ///
    /// Errors from sqlx are converted automatically, except unique
    /// violations on user email which repositories turn into
    /// [`FileshareError::DuplicateEmail`].
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The email address already belongs to an account.
    #[error("duplicate email")]
    DuplicateEmail,

    /// Unknown email or wrong password. The two cases are deliberately
    /// indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (or expired).
    #[error("{0} not found")]
    NotFound(String),

    /// Outbound mail error.
    #[error("mail error: {0}")]
    Mail(String),

    /// Password hashing error.
    #[error("password hash error: {0}")]
    PasswordHash(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for FileshareError {
    fn from(e: sqlx::Error) -> Self {
        FileshareError::Database(e.to_string())
    }
}

/// Result type alias for fileshare operations.
pub type Result<T> = std::result::Result<T, FileshareError>;
