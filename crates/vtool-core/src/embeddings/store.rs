//! In-memory embedding store

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::OnceCell;

use super::error::{EmbeddingError, EmbeddingResult};
use super::traits::{Embedding, EmbeddingKind, EmbeddingService, EmbeddingSnapshotSource};
use crate::logging::Logger;
use crate::types::CancellationToken;

/// Map from tool name to embedding
///
/// Seeded once from the precomputed snapshot, then backfilled through the
/// embedding service for names the snapshot does not cover. Backfilled
/// vectors live for the lifetime of the store and are never written back to
/// the snapshot.
pub struct EmbeddingStore {
    kind: EmbeddingKind,
    service: Arc<dyn EmbeddingService>,
    snapshot: Arc<dyn EmbeddingSnapshotSource>,
    embeddings: RwLock<HashMap<String, Embedding>>,
    seeded: OnceCell<()>,
    logger: Arc<dyn Logger>,
}

impl EmbeddingStore {
    pub fn new(
        kind: EmbeddingKind,
        service: Arc<dyn EmbeddingService>,
        snapshot: Arc<dyn EmbeddingSnapshotSource>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            kind,
            service,
            snapshot,
            embeddings: RwLock::new(HashMap::new()),
            seeded: OnceCell::new(),
            logger,
        }
    }

    pub fn kind(&self) -> &EmbeddingKind {
        &self.kind
    }

    pub fn service(&self) -> &Arc<dyn EmbeddingService> {
        &self.service
    }

    /// Load the snapshot on first use. A failed load leaves the store empty.
    pub async fn ensure_seeded(&self) {
        self.seeded
            .get_or_init(|| async {
                match self.snapshot.load().await {
                    Ok(snapshot) => {
                        self.logger.debug(&format!(
                            "[ToolEmbeddings] Loaded {} precomputed embeddings",
                            snapshot.len()
                        ));
                        let mut embeddings = self.embeddings.write();
                        for (name, embedding) in snapshot {
                            embeddings.entry(name).or_insert(embedding);
                        }
                    }
                    Err(e) => {
                        self.logger.warn(&format!(
                            "[ToolEmbeddings] Failed to load precomputed embeddings: {}",
                            e
                        ));
                    }
                }
            })
            .await;
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded.initialized()
    }

    pub fn get(&self, name: &str) -> Option<Embedding> {
        self.embeddings.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.embeddings.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.embeddings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names from `names` with no stored vector, first occurrence order, no duplicates
    pub fn missing(&self, names: &[String]) -> Vec<String> {
        let embeddings = self.embeddings.read();
        let mut seen = HashSet::new();
        names
            .iter()
            .filter(|name| !embeddings.contains_key(*name) && seen.insert(name.as_str()))
            .cloned()
            .collect()
    }

    /// Compute and store vectors for `names` in one service call.
    ///
    /// A response with the wrong number of vectors stores nothing.
    pub async fn backfill(&self, names: &[String], cancel: &CancellationToken) -> EmbeddingResult<usize> {
        if names.is_empty() {
            return Ok(0);
        }

        let vectors = cancel
            .run_until_cancelled(self.service.compute_embeddings(&self.kind, names, cancel))
            .await
            .ok_or(EmbeddingError::Cancelled)??;

        if vectors.len() != names.len() {
            return Err(EmbeddingError::LengthMismatch {
                expected: names.len(),
                actual: vectors.len(),
            });
        }

        let mut embeddings = self.embeddings.write();
        for (name, vector) in names.iter().zip(vectors) {
            embeddings.insert(name.clone(), vector);
        }
        Ok(names.len())
    }

    /// `(name, vector)` pairs for every name that has a vector, in input order
    pub fn corpus(&self, names: &[String]) -> Vec<(String, Embedding)> {
        let embeddings = self.embeddings.read();
        let mut seen = HashSet::new();
        names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .filter_map(|name| embeddings.get(name).map(|e| (name.clone(), e.clone())))
            .collect()
    }
}

impl std::fmt::Debug for EmbeddingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingStore")
            .field("kind", &self.kind)
            .field("embeddings", &self.len())
            .field("seeded", &self.is_seeded())
            .finish()
    }
}
