//! Shared primitives for all Rust crates of the retention policy provider.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the provider crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input caught before any remote call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Opaque resource identifier does not decompose into the expected segments.
    #[error("parse error: {0}")]
    Parse(String),

    /// Transport failure or provider-reported failure.
    #[error("remote call failed: {0}")]
    RemoteCall(String),

    /// Asynchronous operation did not reach a terminal state before the deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Requested remote object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Prefixes the error message with additional context, keeping the category.
    #[must_use]
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            Self::Validation(message) => Self::Validation(format!("{context}: {message}")),
            Self::Parse(message) => Self::Parse(format!("{context}: {message}")),
            Self::RemoteCall(message) => Self::RemoteCall(format!("{context}: {message}")),
            Self::Timeout(message) => Self::Timeout(format!("{context}: {message}")),
            Self::NotFound(message) => Self::NotFound(format!("{context}: {message}")),
            Self::Internal(message) => Self::Internal(format!("{context}: {message}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn context_keeps_error_category() {
        let error = AppError::Timeout("operation still running".to_owned())
            .with_context("waiting for SQL Server \"srv1\"");

        assert!(matches!(error, AppError::Timeout(_)));
        assert_eq!(
            error.to_string(),
            "timed out: waiting for SQL Server \"srv1\": operation still running"
        );
    }
}
