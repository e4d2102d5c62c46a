//! Categorization error types

use thiserror::Error;

/// Errors surfaced by the categorization oracle or cache
#[derive(Error, Debug, Clone)]
pub enum CategorizationError {
    /// The request was cancelled
    #[error("Categorization cancelled")]
    Cancelled,

    /// The oracle call failed (network, model, quota)
    #[error("Categorization oracle failed: {message}")]
    Oracle { message: String },

    /// The oracle answered with something that could not be used
    #[error("Invalid categorization response: {0}")]
    InvalidResponse(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl CategorizationError {
    /// Create an oracle failure
    pub fn oracle(message: impl Into<String>) -> Self {
        Self::Oracle {
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Cancellation is not retried
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type CategorizationResult<T> = Result<T, CategorizationError>;
