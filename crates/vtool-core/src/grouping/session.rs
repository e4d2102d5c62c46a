//! Per-conversation tool grouping session

use std::sync::Arc;

use serde_json::json;

use super::error::GroupingResult;
use super::expansion::collapse_to_limit;
use super::grouper::VirtualToolGrouper;
use super::report::GroupingReport;
use crate::logging::Logger;
use crate::types::{CancellationToken, Tool, ToolCall, ToolNode, ToolResult, VirtualTool};

/// Tree state for one conversation
///
/// Tracks turns so that activated groups can be collapsed least recently
/// used first when the visible set outgrows the hard limit.
pub struct ToolGrouping {
    grouper: Arc<VirtualToolGrouper>,
    root: VirtualTool,
    turn: u32,
    last_report: Option<GroupingReport>,
    logger: Arc<dyn Logger>,
}

impl ToolGrouping {
    pub fn new(grouper: Arc<VirtualToolGrouper>, logger: Arc<dyn Logger>) -> Self {
        Self {
            grouper,
            root: VirtualTool::root(Vec::new()),
            turn: 0,
            last_report: None,
            logger,
        }
    }

    pub fn root(&self) -> &VirtualTool {
        &self.root
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Report from the most recent successful `compute`
    pub fn last_report(&self) -> Option<&GroupingReport> {
        self.last_report.as_ref()
    }

    /// Advance to the next conversation turn
    pub fn did_take_turn(&mut self) {
        self.turn += 1;
    }

    /// Regroup `tools` for `query` and return what the model should see
    pub async fn compute(
        &mut self,
        query: &str,
        tools: Vec<Tool>,
        cancel: &CancellationToken,
    ) -> GroupingResult<Vec<Tool>> {
        let report = self
            .grouper
            .add_groups(query, &mut self.root, tools, cancel)
            .await?;
        self.last_report = Some(report);
        Ok(self.visible_tools())
    }

    /// Visible items as plain tool definitions, capped at the hard limit
    pub fn visible_tools(&self) -> Vec<Tool> {
        let limit = self.grouper.config().hard_tool_limit;
        let mut tools: Vec<Tool> = self.root.tools().map(to_tool).collect();
        if tools.len() > limit {
            self.logger.warn(&format!(
                "[ToolGrouping] {} top-level items exceed the limit of {}, truncating",
                tools.len(),
                limit
            ));
            tools.truncate(limit);
        }
        tools
    }

    /// Record a tool call made by the model.
    ///
    /// Calling a group activates it and yields the result to hand back to the
    /// model. Calling a real tool marks its group as used and yields `None`.
    pub fn did_call(&mut self, call: &ToolCall) -> Option<ToolResult> {
        let turn = self.turn;

        if let Some(group) = self.root.visible_group_mut(&call.name) {
            group.is_expanded = true;
            group.metadata.pre_expanded = false;
            group.last_used_on_turn = Some(turn);
            let activated: Vec<&str> = group.contents.iter().map(ToolNode::name).collect();
            let content = format!("Tools activated: {}", activated.join(", "));
            self.logger
                .debug(&format!("[ToolGrouping] Activated {}", call.name));
            self.enforce_limit();
            return Some(ToolResult::success(call.id.clone(), content));
        }

        if let Some(parent) = self.root.parent_of_mut(&call.name) {
            if !parent.name.is_empty() {
                parent.last_used_on_turn = Some(turn);
            }
        }
        None
    }

    /// Collapse expanded groups until the visible count fits the hard limit.
    ///
    /// Budget expansions go first, then activations by age.
    fn enforce_limit(&mut self) {
        let limit = self.grouper.config().hard_tool_limit;
        for name in collapse_to_limit(&mut self.root, limit) {
            self.logger.debug(&format!(
                "[ToolGrouping] Collapsed {} to stay under {} tools",
                name, limit
            ));
        }
    }
}

impl std::fmt::Debug for ToolGrouping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolGrouping")
            .field("turn", &self.turn)
            .field("visible", &self.root.visible_count())
            .finish()
    }
}

fn to_tool(node: &ToolNode) -> Tool {
    match node {
        ToolNode::Leaf(tool) => tool.clone(),
        ToolNode::Group(group) => Tool::new(group.name.clone(), group.description.clone())
            .with_schema(json!({ "type": "object", "properties": {} })),
    }
}
