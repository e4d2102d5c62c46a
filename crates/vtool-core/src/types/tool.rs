//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a tool comes from
///
/// Sources are opaque identifiers; the grouping engine only uses them to
/// bucket tools into toolsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ToolSource {
    /// Shipped with the host application
    Builtin,
    /// Contributed by an installed extension
    Extension {
        /// Extension identifier, e.g. `publisher.name`
        id: String,
    },
    /// Exposed by an external MCP server
    Mcp {
        /// Server label as configured by the user
        label: String,
    },
}

impl ToolSource {
    /// Create an extension source
    pub fn extension(id: impl Into<String>) -> Self {
        ToolSource::Extension { id: id.into() }
    }

    /// Create an MCP server source
    pub fn mcp(label: impl Into<String>) -> Self {
        ToolSource::Mcp { label: label.into() }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, ToolSource::Builtin)
    }
}

impl Default for ToolSource {
    fn default() -> Self {
        ToolSource::Builtin
    }
}

/// Tool definition for function calling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    /// Contributing source
    #[serde(default)]
    pub source: ToolSource,
}

impl Tool {
    /// Create a new builtin tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
            source: ToolSource::Builtin,
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Set the contributing source
    pub fn with_source(mut self, source: ToolSource) -> Self {
        self.source = source;
        self
    }
}

/// Tool call from the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Input arguments for the tool
    pub input: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// Tool result to send back to LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is responding to
    #[serde(rename = "callId")]
    pub call_id: String,
    /// The result content
    pub content: String,
    /// Whether this result represents an error
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: error.into(),
            is_error: true,
        }
    }
}
