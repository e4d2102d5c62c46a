//! Embedding error types

use thiserror::Error;

/// Errors that can occur while loading or computing embeddings
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Request was cancelled
    #[error("Embedding request cancelled")]
    Cancelled,

    /// The embedding service failed
    #[error("Embedding service error: {0}")]
    Service(String),

    /// The service answered with the wrong number of vectors
    #[error("Embedding service returned {actual} vectors for {expected} inputs")]
    LengthMismatch { expected: usize, actual: usize },

    /// The precomputed snapshot could not be used
    #[error("Embedding snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EmbeddingError {
    /// Create a service error
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }

    /// Create a snapshot error
    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot(message.into())
    }
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;
