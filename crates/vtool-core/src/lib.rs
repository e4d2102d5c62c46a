//! Virtual Tools Core
//!
//! Keeps large tool inventories usable by an LLM. Tools contributed by
//! extensions and MCP servers are categorized into synthetic "activate" tools;
//! the model calls one to reveal the real tools behind it.
//!
//! ## Grouping
//!
//! ```rust,ignore
//! use vtool_core::{ToolGrouping, VirtualToolGrouper, GroupingConfig};
//!
//! let grouper = VirtualToolGrouper::new(oracle, cache, GroupingConfig::default(), logger.clone())?
//!     .with_embeddings(computer);
//! let mut session = ToolGrouping::new(Arc::new(grouper), logger);
//!
//! // Tools to send with the next request
//! let tools = session.compute(&user_query, all_tools, &cancel).await?;
//!
//! // Feed model tool calls back so activations take effect
//! if let Some(result) = session.did_call(&call) {
//!     // answer the model with `result`
//! }
//! session.did_take_turn();
//! ```

pub mod categorization;
pub mod config;
pub mod embeddings;
pub mod grouping;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use types::{
    CancellationToken, Tool, ToolCall, ToolNode, ToolResult, ToolSource, VirtualTool,
    VirtualToolMetadata, VIRTUAL_TOOL_NAME_PREFIX,
};

pub use categorization::{
    CategorizationCache, CategorizationError, CategorizationOracle, MemoryCategorizationCache,
    ToolCategory,
};

pub use embeddings::{
    Embedding, EmbeddingKind, EmbeddingService, EmbeddingSnapshotSource, FileEmbeddingSnapshot,
    SimilarityRanker, ToolEmbeddingsComputer,
};

pub use logging::{ConsoleLogger, Logger, NoOpLogger, TracingLogger};

pub use config::{ConfigProvider, FileConfigProvider, GroupingConfig, MemoryConfigProvider};

pub use grouping::{GroupingError, GroupingReport, GroupingResult, ToolGrouping, VirtualToolGrouper};
