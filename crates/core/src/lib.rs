//! Shared primitives for all Rust crates in the AD manager console.

#![forbid(unsafe_code)]

/// Authentication primitives shared across crates.
pub mod auth;

use thiserror::Error;

pub use auth::{AccessToken, token_fingerprint};

/// Result type used across AD manager crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Login was refused or the login response was unusable.
    ///
    /// The message is meant to be shown to the user as-is.
    #[error("{0}")]
    Authentication(String),

    /// The backend could not be reached or its body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("backend rejected request with status {status}: {message}")]
    Rejected {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Reason reported by the backend, or a generic description.
        message: String,
    },

    /// User is not authenticated or the session is no longer accepted.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
