//! Tool relevance retrieval
//!
//! Answers "which of these available tools are closest to this query" by
//! combining the [`EmbeddingStore`] with a [`Ranker`]. Every failure here is
//! soft: the result is a relevance hint, so errors shrink the answer instead
//! of surfacing.

use std::sync::Arc;

use super::ranker::{Ranker, SimilarityRanker};
use super::store::EmbeddingStore;
use super::traits::{Embedding, EmbeddingKind, EmbeddingService, EmbeddingSnapshotSource};
use crate::logging::Logger;
use crate::types::CancellationToken;

pub struct ToolEmbeddingsComputer {
    store: EmbeddingStore,
    ranker: Arc<dyn Ranker>,
    logger: Arc<dyn Logger>,
}

impl ToolEmbeddingsComputer {
    /// Create a computer using cosine similarity ranking
    pub fn new(
        service: Arc<dyn EmbeddingService>,
        snapshot: Arc<dyn EmbeddingSnapshotSource>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::with_ranker(
            EmbeddingKind::default(),
            service,
            snapshot,
            Arc::new(SimilarityRanker::new()),
            logger,
        )
    }

    pub fn with_ranker(
        kind: EmbeddingKind,
        service: Arc<dyn EmbeddingService>,
        snapshot: Arc<dyn EmbeddingSnapshotSource>,
        ranker: Arc<dyn Ranker>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            store: EmbeddingStore::new(kind, service, snapshot, Arc::clone(&logger)),
            ranker,
            logger,
        }
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Names from `available` closest to `query`, at most `count`, closest first.
    ///
    /// Names whose vector is neither precomputed nor computable are left out
    /// of the ranking. Cancellation yields an empty list.
    pub async fn retrieve_similar_embeddings_for_available_tools(
        &self,
        query: &Embedding,
        available: &[String],
        count: usize,
        cancel: &CancellationToken,
    ) -> Vec<String> {
        if available.is_empty() || count == 0 {
            return Vec::new();
        }

        self.store.ensure_seeded().await;

        if cancel.is_cancelled() {
            return Vec::new();
        }

        let missing = self.store.missing(available);
        if !missing.is_empty() {
            match self.store.backfill(&missing, cancel).await {
                Ok(stored) => self.logger.debug(&format!(
                    "[ToolEmbeddings] Computed {} missing tool embeddings",
                    stored
                )),
                Err(e) => self.logger.warn(&format!(
                    "[ToolEmbeddings] Failed to compute embeddings for {} tools: {}",
                    missing.len(),
                    e
                )),
            }
        }

        if cancel.is_cancelled() {
            return Vec::new();
        }

        let corpus = self.store.corpus(available);
        self.ranker.rank(query, &corpus, count)
    }

    /// Embed a free-text query with the store's model
    pub async fn embed_query(&self, query: &str, cancel: &CancellationToken) -> Option<Embedding> {
        let inputs = [query.to_string()];
        let result = cancel
            .run_until_cancelled(
                self.store
                    .service()
                    .compute_embeddings(self.store.kind(), &inputs, cancel),
            )
            .await?;

        match result {
            Ok(mut vectors) if vectors.len() == 1 => vectors.pop(),
            Ok(vectors) => {
                self.logger.warn(&format!(
                    "[ToolEmbeddings] Query embedding returned {} vectors",
                    vectors.len()
                ));
                None
            }
            Err(e) => {
                self.logger.warn(&format!("[ToolEmbeddings] Failed to embed query: {}", e));
                None
            }
        }
    }
}

impl std::fmt::Debug for ToolEmbeddingsComputer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEmbeddingsComputer")
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{MockEmbeddingService, StaticEmbeddingSnapshot};
    use crate::logging::NoOpLogger;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Ranker returning a fixed answer and recording the corpus it saw
    struct FixedRanker {
        answer: Vec<String>,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl FixedRanker {
        fn new(answer: &[&str]) -> Self {
            Self {
                answer: answer.iter().map(|s| s.to_string()).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Ranker for FixedRanker {
        fn rank(&self, _query: &Embedding, corpus: &[(String, Embedding)], count: usize) -> Vec<String> {
            self.seen
                .lock()
                .push(corpus.iter().map(|(k, _)| k.clone()).collect());
            self.answer.iter().take(count).cloned().collect()
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn snapshot(entries: &[(&str, [f32; 2])]) -> StaticEmbeddingSnapshot {
        let map: HashMap<String, Embedding> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), Embedding::new(v.to_vec())))
            .collect();
        StaticEmbeddingSnapshot::new(map)
    }

    fn computer(
        service: MockEmbeddingService,
        snapshot: StaticEmbeddingSnapshot,
        ranker: Arc<dyn Ranker>,
    ) -> ToolEmbeddingsComputer {
        ToolEmbeddingsComputer::with_ranker(
            EmbeddingKind::default(),
            Arc::new(service),
            Arc::new(snapshot),
            ranker,
            Arc::new(NoOpLogger::new()),
        )
    }

    #[tokio::test]
    async fn test_empty_available_returns_nothing() {
        let ranker = Arc::new(FixedRanker::new(&["a", "b"]));
        let computer = computer(MockEmbeddingService::new(2), snapshot(&[]), ranker.clone());

        let result = computer
            .retrieve_similar_embeddings_for_available_tools(
                &Embedding::new(vec![1.0, 0.0]),
                &[],
                5,
                &CancellationToken::new(),
            )
            .await;

        assert!(result.is_empty());
        assert!(ranker.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_returns_ranker_order() {
        let ranker = Arc::new(FixedRanker::new(&["b", "a"]));
        let computer = computer(
            MockEmbeddingService::new(2),
            snapshot(&[("a", [1.0, 0.0]), ("b", [0.0, 1.0]), ("c", [1.0, 1.0])]),
            ranker.clone(),
        );

        let result = computer
            .retrieve_similar_embeddings_for_available_tools(
                &Embedding::new(vec![1.0, 0.0]),
                &names(&["a", "b", "c"]),
                2,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result, names(&["b", "a"]));
        assert_eq!(ranker.seen.lock()[0], names(&["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_uncomputable_names_are_excluded() {
        let ranker = Arc::new(FixedRanker::new(&["a"]));
        let computer = computer(
            MockEmbeddingService::new(2).failing(),
            snapshot(&[("a", [1.0, 0.0])]),
            ranker.clone(),
        );

        let result = computer
            .retrieve_similar_embeddings_for_available_tools(
                &Embedding::new(vec![1.0, 0.0]),
                &names(&["a", "unknown"]),
                2,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result, names(&["a"]));
        assert_eq!(ranker.seen.lock()[0], names(&["a"]));
    }

    #[tokio::test]
    async fn test_backfilled_vectors_are_reused() {
        let service = Arc::new(MockEmbeddingService::new(8));
        let computer = ToolEmbeddingsComputer::new(
            service.clone(),
            Arc::new(StaticEmbeddingSnapshot::empty()),
            Arc::new(NoOpLogger::new()),
        );
        let query = Embedding::new(vec![1.0; 8]);
        let available = names(&["git_status", "git_commit"]);
        let cancel = CancellationToken::new();

        computer
            .retrieve_similar_embeddings_for_available_tools(&query, &available, 2, &cancel)
            .await;
        let second = computer
            .retrieve_similar_embeddings_for_available_tools(&query, &available, 2, &cancel)
            .await;

        assert_eq!(second.len(), 2);
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_returns_empty() {
        let ranker = Arc::new(FixedRanker::new(&["a"]));
        let computer = computer(
            MockEmbeddingService::new(2),
            snapshot(&[("a", [1.0, 0.0])]),
            ranker.clone(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = computer
            .retrieve_similar_embeddings_for_available_tools(
                &Embedding::new(vec![1.0, 0.0]),
                &names(&["a"]),
                1,
                &cancel,
            )
            .await;

        assert!(result.is_empty());
        assert!(ranker.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_embed_query() {
        let computer = ToolEmbeddingsComputer::new(
            Arc::new(MockEmbeddingService::new(2).with_vector("find bugs", vec![0.0, 1.0])),
            Arc::new(StaticEmbeddingSnapshot::empty()),
            Arc::new(NoOpLogger::new()),
        );
        let embedding = computer
            .embed_query("find bugs", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(embedding.values, vec![0.0, 1.0]);

        let failing = ToolEmbeddingsComputer::new(
            Arc::new(MockEmbeddingService::new(2).failing()),
            Arc::new(StaticEmbeddingSnapshot::empty()),
            Arc::new(NoOpLogger::new()),
        );
        assert!(failing.embed_query("x", &CancellationToken::new()).await.is_none());
    }
}
