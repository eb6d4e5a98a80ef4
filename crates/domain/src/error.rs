//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// An assertion specification is internally inconsistent.
    #[error("invalid assertion: {0}")]
    InvalidAssertion(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
