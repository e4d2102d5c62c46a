//! Embedding service and snapshot traits

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::EmbeddingResult;
use crate::types::CancellationToken;

/// Embedding model identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingKind(pub String);

impl EmbeddingKind {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EmbeddingKind {
    fn default() -> Self {
        Self::new("text-embedding-3-small-512")
    }
}

/// A dense vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dimensions(&self) -> usize {
        self.values.len()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// External service turning text into vectors
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Compute one vector per input, aligned 1:1 with `inputs`
    async fn compute_embeddings(
        &self,
        kind: &EmbeddingKind,
        inputs: &[String],
        cancel: &CancellationToken,
    ) -> EmbeddingResult<Vec<Embedding>>;
}

/// Precomputed name → vector table shipped with the host
#[async_trait]
pub trait EmbeddingSnapshotSource: Send + Sync {
    async fn load(&self) -> EmbeddingResult<HashMap<String, Embedding>>;
}
