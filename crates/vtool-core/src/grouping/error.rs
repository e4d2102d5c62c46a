//! Grouping error types

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that escape the grouper
///
/// Oracle and embedding failures never show up here; they degrade the tree
/// instead.
#[derive(Error, Debug)]
pub enum GroupingError {
    /// The categorization oracle reported cancellation
    #[error("Tool grouping cancelled")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type GroupingResult<T> = Result<T, GroupingError>;
