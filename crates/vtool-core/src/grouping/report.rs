//! Per-call grouping summary

use serde::Serialize;

/// What happened to one toolset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsetReport {
    pub toolset_key: String,
    pub tools_before: usize,
    /// Groups built for the toolset
    pub groups_after: usize,
    /// Failed oracle attempts
    pub retries: usize,
    /// Tools left individually visible because they could not be placed
    pub uncategorized: Vec<String>,
    /// Whether a previous categorization was offered to the oracle
    pub reused_previous: bool,
    /// False when the toolset was too small to group
    pub grouped: bool,
}

/// Summary of one `add_groups` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingReport {
    pub total_tools: usize,
    /// False when the tool count was below the grouping threshold
    pub grouped: bool,
    pub toolsets: Vec<ToolsetReport>,
    pub expanded_for_query: Vec<String>,
    pub expanded_for_budget: Vec<String>,
    /// Groups collapsed to get back under the hard limit
    pub collapsed_for_limit: Vec<String>,
    pub visible_count: usize,
    /// Cancellation was observed and remaining work skipped
    pub cancelled: bool,
}

impl GroupingReport {
    /// Report for a call that did not group at all
    pub fn ungrouped(total_tools: usize) -> Self {
        Self {
            total_tools,
            visible_count: total_tools,
            ..Self::default()
        }
    }

    /// Every tool left uncategorized, across toolsets
    pub fn uncategorized_tools(&self) -> impl Iterator<Item = &str> {
        self.toolsets
            .iter()
            .flat_map(|ts| ts.uncategorized.iter().map(String::as_str))
    }

    pub fn toolset(&self, key: &str) -> Option<&ToolsetReport> {
        self.toolsets.iter().find(|ts| ts.toolset_key == key)
    }
}
