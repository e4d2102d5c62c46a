//! Semantic categorization of tool lists
//!
//! The grouper never talks to a model directly. It goes through a
//! [`CategorizationOracle`] (usually an LLM request made by the host) and a
//! [`CategorizationCache`] keyed by the exact tool list.
//!
//! `MockOracle` is kept for testing purposes.

mod cache;
mod error;
mod mock;
mod traits;

pub use cache::MemoryCategorizationCache;
pub use error::{CategorizationError, CategorizationResult};
pub use mock::{MockOracle, MockOracleCall, MockOracleCallKind, MockOracleMode};
pub use traits::{CategorizationCache, CategorizationFuture, CategorizationOracle, ToolCategory};
