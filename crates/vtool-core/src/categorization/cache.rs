//! In-memory categorization cache

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use super::error::CategorizationResult;
use super::traits::{CategorizationCache, CategorizationFuture, ToolCategory};
use crate::types::Tool;

/// Exact `(name, description)` sequence of the categorized tools
type CacheKey = Vec<(String, String)>;

struct CacheEntry {
    cell: Arc<OnceCell<Vec<ToolCategory>>>,
    touched: bool,
}

/// Process-local categorization cache
///
/// Keys are the full tool list, so a renamed or re-described tool produces a
/// fresh categorization. Each key owns a `OnceCell`: concurrent lookups for
/// the same list wait on the first computation instead of starting their
/// own. Failed computations leave the cell empty so the next caller retries.
///
/// # Example
///
/// ```
/// use vtool_core::categorization::{
///     CategorizationCache, CategorizationError, MemoryCategorizationCache, ToolCategory,
/// };
/// use vtool_core::Tool;
///
/// let cache = MemoryCategorizationCache::new();
/// let tools = vec![Tool::new("a", "first")];
/// let groups = futures::executor::block_on(cache.get_or_insert(
///     &tools,
///     Box::pin(async { Ok::<_, CategorizationError>(vec![ToolCategory::new("g", "", ["a"])]) }),
/// ))
/// .unwrap();
/// assert_eq!(groups[0].name, "g");
/// ```
#[derive(Default)]
pub struct MemoryCategorizationCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryCategorizationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn key_for(tools: &[Tool]) -> CacheKey {
        tools
            .iter()
            .map(|t| (t.name.clone(), t.description.clone()))
            .collect()
    }
}

#[async_trait]
impl CategorizationCache for MemoryCategorizationCache {
    async fn get_or_insert<'a>(
        &'a self,
        tools: &'a [Tool],
        compute: CategorizationFuture<'a>,
    ) -> CategorizationResult<Vec<ToolCategory>> {
        let cell = {
            let mut entries = self.entries.lock();
            let entry = entries
                .entry(Self::key_for(tools))
                .or_insert_with(|| CacheEntry {
                    cell: Arc::new(OnceCell::new()),
                    touched: false,
                });
            entry.touched = true;
            Arc::clone(&entry.cell)
        };

        cell.get_or_try_init(|| compute).await.cloned()
    }

    fn flush(&self) {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.touched);
        for entry in entries.values_mut() {
            entry.touched = false;
        }
    }
}

impl std::fmt::Debug for MemoryCategorizationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCategorizationCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorization::CategorizationError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tools(names: &[&str]) -> Vec<Tool> {
        names.iter().map(|n| Tool::new(*n, format!("{} tool", n))).collect()
    }

    fn category(name: &str) -> Vec<ToolCategory> {
        vec![ToolCategory::new(name, "summary", ["a"])]
    }

    #[tokio::test]
    async fn test_hit_skips_compute() {
        let cache = MemoryCategorizationCache::new();
        let list = tools(&["a", "b"]);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let result = cache
                .get_or_insert(
                    &list,
                    Box::pin(async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, CategorizationError>(category("first"))
                    }),
                )
                .await
                .unwrap();
            assert_eq!(result[0].name, "first");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_key_includes_description() {
        let cache = MemoryCategorizationCache::new();
        let original = tools(&["a"]);
        let mut changed = original.clone();
        changed[0].description = "something else".to_string();

        cache
            .get_or_insert(&original, Box::pin(async { Ok::<_, CategorizationError>(category("one")) }))
            .await
            .unwrap();
        let result = cache
            .get_or_insert(&changed, Box::pin(async { Ok::<_, CategorizationError>(category("two")) }))
            .await
            .unwrap();

        assert_eq!(result[0].name, "two");
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = MemoryCategorizationCache::new();
        let list = tools(&["a"]);

        let err = cache
            .get_or_insert(
                &list,
                Box::pin(async { Err::<Vec<ToolCategory>, _>(CategorizationError::oracle("boom")) }),
            )
            .await;
        assert!(err.is_err());

        let ok = cache
            .get_or_insert(&list, Box::pin(async { Ok::<_, CategorizationError>(category("retry")) }))
            .await
            .unwrap();
        assert_eq!(ok[0].name, "retry");
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_computation() {
        let cache = MemoryCategorizationCache::new();
        let list = tools(&["a", "b", "c"]);
        let calls = AtomicUsize::new(0);

        let lookup = || {
            cache.get_or_insert(
                &list,
                Box::pin(async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    Ok::<_, CategorizationError>(category("shared"))
                }),
            )
        };
        let (a, b) = futures::join!(lookup(), lookup());

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flush_keeps_one_generation() {
        let cache = MemoryCategorizationCache::new();
        let old = tools(&["old"]);
        let new = tools(&["new"]);

        cache
            .get_or_insert(&old, Box::pin(async { Ok::<_, CategorizationError>(category("old")) }))
            .await
            .unwrap();
        cache.flush();
        assert_eq!(cache.len(), 1);

        cache
            .get_or_insert(&new, Box::pin(async { Ok::<_, CategorizationError>(category("new")) }))
            .await
            .unwrap();
        cache.flush();

        assert_eq!(cache.len(), 1);
        let result = cache
            .get_or_insert(&new, Box::pin(async { Ok::<_, CategorizationError>(category("recomputed")) }))
            .await
            .unwrap();
        assert_eq!(result[0].name, "new");
    }
}
