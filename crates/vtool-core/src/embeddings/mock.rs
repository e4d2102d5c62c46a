//! Mock embedding service for testing
//!
//! Provides deterministic vectors without network dependencies. Inputs with
//! an explicit vector get that vector; everything else gets a bag-of-words
//! vector so texts sharing words land close together.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{EmbeddingError, EmbeddingResult};
use super::traits::{Embedding, EmbeddingKind, EmbeddingService};
use crate::types::CancellationToken;

/// Mock response mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MockEmbeddingMode {
    /// Return one vector per input
    #[default]
    Answer,
    /// Fail every request
    Fail,
    /// Return one vector fewer than requested
    ShortResponse,
}

/// Deterministic embedding service
pub struct MockEmbeddingService {
    dimensions: usize,
    mode: MockEmbeddingMode,
    vectors: HashMap<String, Embedding>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockEmbeddingService {
    /// Create a service producing `dimensions`-wide vectors
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            mode: MockEmbeddingMode::Answer,
            vectors: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Return `vector` whenever `input` is requested
    pub fn with_vector(mut self, input: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(input.into(), Embedding::new(vector));
        self
    }

    /// Fail every request
    pub fn failing(mut self) -> Self {
        self.mode = MockEmbeddingMode::Fail;
        self
    }

    /// Answer with one vector too few
    pub fn short_response(mut self) -> Self {
        self.mode = MockEmbeddingMode::ShortResponse;
        self
    }

    /// Inputs of every request made so far
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    fn bag_of_words(&self, input: &str) -> Embedding {
        let mut values = vec![0.0_f32; self.dimensions];
        for word in input
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            values[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }
        Embedding::new(values)
    }
}

#[async_trait]
impl EmbeddingService for MockEmbeddingService {
    async fn compute_embeddings(
        &self,
        _kind: &EmbeddingKind,
        inputs: &[String],
        cancel: &CancellationToken,
    ) -> EmbeddingResult<Vec<Embedding>> {
        self.calls.lock().push(inputs.to_vec());

        if cancel.is_cancelled() {
            return Err(EmbeddingError::Cancelled);
        }

        let mut vectors: Vec<Embedding> = match self.mode {
            MockEmbeddingMode::Fail => {
                return Err(EmbeddingError::service("mock embedding failure"));
            }
            MockEmbeddingMode::Answer | MockEmbeddingMode::ShortResponse => inputs
                .iter()
                .map(|input| {
                    self.vectors
                        .get(input)
                        .cloned()
                        .unwrap_or_else(|| self.bag_of_words(input))
                })
                .collect(),
        };

        if self.mode == MockEmbeddingMode::ShortResponse {
            vectors.pop();
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    #[tokio::test]
    async fn test_shared_words_are_similar() {
        let service = MockEmbeddingService::new(64);
        let inputs = vec![
            "list github issues".to_string(),
            "github issues".to_string(),
            "play music".to_string(),
        ];
        let vectors = service
            .compute_embeddings(&EmbeddingKind::default(), &inputs, &CancellationToken::new())
            .await
            .unwrap();

        let close = cosine_similarity(&vectors[0].values, &vectors[1].values);
        let far = cosine_similarity(&vectors[0].values, &vectors[2].values);
        assert!(close > far);
    }

    #[tokio::test]
    async fn test_modes() {
        let kind = EmbeddingKind::default();
        let cancel = CancellationToken::new();
        let inputs = vec!["a".to_string(), "b".to_string()];

        let fixed = MockEmbeddingService::new(2).with_vector("a", vec![0.5, 0.5]);
        let vectors = fixed.compute_embeddings(&kind, &inputs, &cancel).await.unwrap();
        assert_eq!(vectors[0].values, vec![0.5, 0.5]);

        let failing = MockEmbeddingService::new(2).failing();
        assert!(failing.compute_embeddings(&kind, &inputs, &cancel).await.is_err());

        let short = MockEmbeddingService::new(2).short_response();
        let vectors = short.compute_embeddings(&kind, &inputs, &cancel).await.unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(short.calls().len(), 1);
    }
}
