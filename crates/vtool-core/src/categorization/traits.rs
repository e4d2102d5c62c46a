//! Categorization oracle and cache traits

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::error::CategorizationResult;
use crate::types::{CancellationToken, Tool};

/// One named group produced by the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCategory {
    /// Short identifier-like name, e.g. `issue_tracking`
    pub name: String,
    /// What the tools in this group have in common
    pub summary: String,
    /// Names of the member tools
    pub tools: Vec<String>,
}

impl ToolCategory {
    pub fn new(
        name: impl Into<String>,
        summary: impl Into<String>,
        tools: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            tools: tools.into_iter().map(Into::into).collect(),
        }
    }
}

/// Semantic classifier that names and groups a tool list
///
/// Implementations typically wrap an LLM request. All methods may fail; the
/// grouper retries ordinary failures and propagates
/// [`CategorizationError::Cancelled`](super::CategorizationError::Cancelled).
#[async_trait]
pub trait CategorizationOracle: Send + Sync {
    /// Produce one category covering every tool in `tools`
    async fn summarize_group(
        &self,
        tools: &[Tool],
        cancel: &CancellationToken,
    ) -> CategorizationResult<ToolCategory>;

    /// Split `tools` into named categories.
    ///
    /// Tools the oracle cannot place go into a category named after the
    /// configured uncategorized sentinel.
    async fn divide_into_groups(
        &self,
        tools: &[Tool],
        cancel: &CancellationToken,
    ) -> CategorizationResult<Vec<ToolCategory>>;

    /// Like [`divide_into_groups`](Self::divide_into_groups) but biased to keep
    /// the `previous` grouping stable
    async fn divide_into_existing_groups(
        &self,
        previous: &[ToolCategory],
        tools: &[Tool],
        cancel: &CancellationToken,
    ) -> CategorizationResult<Vec<ToolCategory>>;
}

/// Deferred categorization handed to the cache
pub type CategorizationFuture<'a> = BoxFuture<'a, CategorizationResult<Vec<ToolCategory>>>;

/// Content-addressed store of categorization results
#[async_trait]
pub trait CategorizationCache: Send + Sync {
    /// Return the cached result for exactly this tool list, or run `compute`
    /// and store its successful output.
    ///
    /// At most one computation per distinct key is in flight at a time.
    async fn get_or_insert<'a>(
        &'a self,
        tools: &'a [Tool],
        compute: CategorizationFuture<'a>,
    ) -> CategorizationResult<Vec<ToolCategory>>;

    /// Drop the entries not used since the previous flush
    fn flush(&self);
}
