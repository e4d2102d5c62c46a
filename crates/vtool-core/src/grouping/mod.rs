//! Virtual tool grouping
//!
//! Turns a flat tool inventory into a tree of collapsible groups so the model
//! sees at most `hardToolLimit` entries:
//! - [`VirtualToolGrouper`]: rebuilds the tree per request
//! - [`ToolGrouping`]: per-conversation state (activations, turns, limit)

mod error;
mod expansion;
mod grouper;
mod report;
mod session;
mod toolset;

pub use error::{GroupingError, GroupingResult};
pub use grouper::{group_description, group_name, VirtualToolGrouper};
pub use report::{GroupingReport, ToolsetReport};
pub use session::ToolGrouping;
pub use toolset::{partition, possible_prefix, toolset_key, Toolset, BUILTIN_TOOLSET_KEY};
