//! Core types shared across the crate
//!
//! Tool definitions as the host sees them, the virtual tool tree built on top
//! of them, and cooperative cancellation.

mod cancellation;
mod tool;
mod virtual_tool;

pub use cancellation::CancellationToken;
pub use tool::{Tool, ToolCall, ToolResult, ToolSource};
pub use virtual_tool::{
    AllNodes, ToolNode, VirtualTool, VirtualToolMetadata, VisibleNodes, VIRTUAL_TOOL_NAME_PREFIX,
};
