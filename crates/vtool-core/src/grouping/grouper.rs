//! Virtual tool grouper
//!
//! Rebuilds the virtual tool tree for one request:
//!
//! ```text
//! tools ──► partition by source ──► categorize each toolset (concurrently,
//!                                   cached, retried, fail-open)
//!       ──► flatten + deduplicate ──► carry over previous node state
//!       ──► query-driven expansion (optional) ──► budget-driven expansion
//! ```
//!
//! Nothing here is fatal. Oracle and embedding failures make the tree flatter
//! or less relevant; no tool is ever dropped.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;

use super::error::{GroupingError, GroupingResult};
use super::expansion::{collapse_to_limit, expand_for_query, expand_to_budget};
use super::report::{GroupingReport, ToolsetReport};
use super::toolset::{partition, possible_prefix, Toolset};
use crate::categorization::{
    CategorizationCache, CategorizationOracle, CategorizationResult, ToolCategory,
};
use crate::config::{ConfigProvider, GroupingConfig};
use crate::embeddings::ToolEmbeddingsComputer;
use crate::logging::Logger;
use crate::types::{
    CancellationToken, Tool, ToolNode, VirtualTool, VirtualToolMetadata, VIRTUAL_TOOL_NAME_PREFIX,
};

const GROUP_DESCRIPTION_HEADER: &str =
    "Call this tool to make the following group of tools available. The group covers:\n\n";
const GROUP_DESCRIPTION_FOOTER: &str =
    "\n\nIf the task needs any capability described above, call this tool first; \
     the individual tools become callable on the next turn.";

/// Longest name an LLM tool API accepts
const MAX_TOOL_NAME_LEN: usize = 64;

/// State of a previous node worth keeping across rebuilds
#[derive(Debug, Clone, Copy)]
struct NodeState {
    is_expanded: bool,
    pre_expanded: bool,
    last_used_on_turn: Option<u32>,
}

/// Snapshot of the previous tree, indexed for reuse
#[derive(Debug, Default)]
struct PreviousTree {
    nodes: HashMap<String, NodeState>,
    categorizations: HashMap<String, Vec<ToolCategory>>,
}

impl PreviousTree {
    fn capture(root: &VirtualTool) -> Self {
        let mut previous = Self::default();
        for group in root.all().filter_map(ToolNode::as_group) {
            previous.nodes.insert(
                group.name.clone(),
                NodeState {
                    is_expanded: group.is_expanded,
                    pre_expanded: group.metadata.pre_expanded,
                    last_used_on_turn: group.last_used_on_turn,
                },
            );
            if !group.metadata.toolset_key.is_empty() && !group.metadata.groups.is_empty() {
                previous
                    .categorizations
                    .entry(group.metadata.toolset_key.clone())
                    .or_insert_with(|| group.metadata.groups.clone());
            }
        }
        previous
    }

    /// Previous categorization for a toolset, limited to its current members
    fn categorization_for(&self, toolset: &Toolset) -> Option<Vec<ToolCategory>> {
        let previous = self.categorizations.get(&toolset.key)?;
        let members: HashSet<&str> = toolset.tool_names().collect();
        let pruned: Vec<ToolCategory> = previous
            .iter()
            .map(|category| ToolCategory {
                tools: category
                    .tools
                    .iter()
                    .filter(|name| members.contains(name.as_str()))
                    .cloned()
                    .collect(),
                ..category.clone()
            })
            .filter(|category| !category.tools.is_empty())
            .collect();
        (!pruned.is_empty()).then_some(pruned)
    }

    fn restore(&self, root: &mut VirtualTool) {
        root.for_each_group_mut(&mut |group| {
            if let Some(state) = self.nodes.get(&group.name) {
                group.is_expanded = state.is_expanded;
                group.metadata.pre_expanded = state.pre_expanded;
                group.last_used_on_turn = state.last_used_on_turn;
            }
        });
    }
}

/// Result of categorizing one toolset
struct ToolsetOutcome {
    nodes: Vec<ToolNode>,
    report: ToolsetReport,
}

/// Builds and maintains the virtual tool tree
pub struct VirtualToolGrouper {
    oracle: Arc<dyn CategorizationOracle>,
    cache: Arc<dyn CategorizationCache>,
    embeddings: Option<Arc<ToolEmbeddingsComputer>>,
    config: GroupingConfig,
    logger: Arc<dyn Logger>,
}

impl VirtualToolGrouper {
    /// Create a grouper, rejecting an invalid configuration
    pub fn new(
        oracle: Arc<dyn CategorizationOracle>,
        cache: Arc<dyn CategorizationCache>,
        config: GroupingConfig,
        logger: Arc<dyn Logger>,
    ) -> GroupingResult<Self> {
        config.validate()?;
        Ok(Self {
            oracle,
            cache,
            embeddings: None,
            config,
            logger,
        })
    }

    /// Create a grouper with configuration read from `provider`
    pub async fn from_provider(
        provider: &dyn ConfigProvider,
        oracle: Arc<dyn CategorizationOracle>,
        cache: Arc<dyn CategorizationCache>,
        logger: Arc<dyn Logger>,
    ) -> GroupingResult<Self> {
        let config = provider.get_config().await?;
        Self::new(oracle, cache, config, logger)
    }

    /// Enable query-driven expansion backed by `computer`
    pub fn with_embeddings(mut self, computer: Arc<ToolEmbeddingsComputer>) -> Self {
        self.embeddings = Some(computer);
        self
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    /// Regroup `tools` into `root`.
    ///
    /// `root.contents` is replaced once, after the new tree is complete. If the
    /// oracle reports cancellation the previous contents stay in place.
    pub async fn add_groups(
        &self,
        query: &str,
        root: &mut VirtualTool,
        tools: Vec<Tool>,
        cancel: &CancellationToken,
    ) -> GroupingResult<GroupingReport> {
        let (contents, report) = self.rebuild(query, root, tools, cancel).await?;
        root.contents = contents;
        Ok(report)
    }

    /// Compute the contents of a new root from `tools`, reusing state from
    /// `previous` by node name. `previous` is not modified.
    pub async fn rebuild(
        &self,
        query: &str,
        previous: &VirtualTool,
        tools: Vec<Tool>,
        cancel: &CancellationToken,
    ) -> GroupingResult<(Vec<ToolNode>, GroupingReport)> {
        let total_tools = tools.len();
        if total_tools < self.config.start_grouping_after_tool_count {
            return Ok((
                tools.into_iter().map(ToolNode::Leaf).collect(),
                GroupingReport::ungrouped(total_tools),
            ));
        }

        let (builtin, toolsets) = partition(tools);
        let previous = PreviousTree::capture(previous);

        let outcomes = join_all(
            toolsets
                .iter()
                .map(|toolset| self.categorize_toolset(toolset, &previous, cancel)),
        )
        .await;
        self.cache.flush();

        let mut report = GroupingReport {
            total_tools,
            grouped: true,
            ..GroupingReport::default()
        };
        let mut items: Vec<ToolNode> = builtin.into_iter().map(ToolNode::Leaf).collect();
        for outcome in outcomes {
            let outcome = outcome?;
            items.extend(outcome.nodes);
            report.toolsets.push(outcome.report);
        }

        let mut tree = VirtualTool::root(Self::deduplicate_groups(items));
        previous.restore(&mut tree);

        if !cancel.is_cancelled() && self.config.embeddings_expansion_enabled {
            let available: Vec<String> = toolsets
                .iter()
                .flat_map(|ts| ts.tool_names().map(str::to_string))
                .collect();
            let predicted = self.predict_tools(query, &available, cancel).await;
            report.expanded_for_query =
                expand_for_query(&mut tree, &predicted, self.config.hard_tool_limit, &*self.logger);
        }

        if cancel.is_cancelled() {
            self.logger
                .debug("[VirtualToolGrouper] Cancelled, skipping expansion");
            report.cancelled = true;
        } else {
            report.expanded_for_budget = expand_to_budget(
                &mut tree,
                self.config.expand_until_count,
                self.config.hard_tool_limit,
                &*self.logger,
            );
        }

        // Restored expansions and grown categories can overshoot the limit
        report.collapsed_for_limit = collapse_to_limit(&mut tree, self.config.hard_tool_limit);
        if !report.collapsed_for_limit.is_empty() {
            self.logger.info(&format!(
                "[VirtualToolGrouper] Collapsed {} groups to stay under {} tools",
                report.collapsed_for_limit.len(),
                self.config.hard_tool_limit
            ));
        }

        report.visible_count = tree.visible_count();
        self.logger.info(&format!(
            "[VirtualToolGrouper] Grouped {} tools into {} visible items",
            total_tools, report.visible_count
        ));
        Ok((tree.contents, report))
    }

    /// Resolve name collisions among top-level items.
    ///
    /// When a name repeats and the item already kept is a group with a
    /// possible prefix, the kept group is renamed with it and the newcomer
    /// takes the original name. Otherwise a newcomer group is stored under
    /// its prefixed name. A group whose new name is still taken gets a
    /// numeric suffix, so no group is ever lost. A repeated leaf with no
    /// prefix to fall back on keeps the first occurrence.
    pub fn deduplicate_groups(items: Vec<ToolNode>) -> Vec<ToolNode> {
        let mut slots: Vec<Option<ToolNode>> = Vec::with_capacity(items.len());
        let mut index: HashMap<String, usize> = HashMap::new();

        for item in items {
            let Some(&slot) = index.get(item.name()) else {
                store_unique(&mut slots, &mut index, item);
                continue;
            };

            let kept_prefix = slots[slot]
                .as_ref()
                .and_then(ToolNode::as_group)
                .and_then(|g| g.metadata.possible_prefix.clone());

            if let Some(prefix) = kept_prefix {
                if let Some(ToolNode::Group(kept)) = slots[slot].take() {
                    index.remove(&kept.name);
                    let renamed = kept.clone_with_prefix(&prefix);
                    store_unique(&mut slots, &mut index, ToolNode::Group(renamed));
                }
                store_unique(&mut slots, &mut index, item);
            } else if let ToolNode::Group(group) = item {
                let renamed = match &group.metadata.possible_prefix {
                    Some(prefix) => group.clone_with_prefix(prefix),
                    None => group,
                };
                store_unique(&mut slots, &mut index, ToolNode::Group(renamed));
            }
        }

        slots.into_iter().flatten().collect()
    }

    async fn predict_tools(
        &self,
        query: &str,
        available: &[String],
        cancel: &CancellationToken,
    ) -> Vec<String> {
        let Some(computer) = &self.embeddings else {
            return Vec::new();
        };
        if query.trim().is_empty() || available.is_empty() {
            return Vec::new();
        }
        let Some(query_embedding) = computer.embed_query(query, cancel).await else {
            return Vec::new();
        };
        computer
            .retrieve_similar_embeddings_for_available_tools(
                &query_embedding,
                available,
                self.config.predicted_tool_count,
                cancel,
            )
            .await
    }

    async fn categorize_toolset(
        &self,
        toolset: &Toolset,
        previous: &PreviousTree,
        cancel: &CancellationToken,
    ) -> GroupingResult<ToolsetOutcome> {
        let mut report = ToolsetReport {
            toolset_key: toolset.key.clone(),
            tools_before: toolset.tools.len(),
            ..ToolsetReport::default()
        };

        if toolset.tools.len() <= self.config.min_toolset_size_to_group {
            return Ok(ToolsetOutcome {
                nodes: toolset.tools.iter().cloned().map(ToolNode::Leaf).collect(),
                report,
            });
        }
        report.grouped = true;

        let previous_groups = previous.categorization_for(toolset);
        report.reused_previous = previous_groups.is_some();

        let max_attempts = self.config.max_categorization_retries;
        let mut categories = None;
        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                break;
            }
            let compute = self.compute_categories(&toolset.tools, previous_groups.as_deref(), cancel);
            match self.cache.get_or_insert(&toolset.tools, Box::pin(compute)).await {
                Ok(result) => {
                    categories = Some(result);
                    break;
                }
                Err(e) if e.is_cancelled() => return Err(GroupingError::Cancelled),
                Err(e) => {
                    report.retries += 1;
                    self.logger.warn(&format!(
                        "[VirtualToolGrouper] Categorizing {} failed (attempt {}/{}): {}",
                        toolset.key, attempt, max_attempts, e
                    ));
                }
            }
        }

        let outcome = match categories {
            Some(categories) => self.build_groups(toolset, categories, report),
            None if cancel.is_cancelled() => {
                self.logger.debug(&format!(
                    "[VirtualToolGrouper] Cancelled before categorizing {}",
                    toolset.key
                ));
                report.grouped = false;
                ToolsetOutcome {
                    nodes: toolset.tools.iter().cloned().map(ToolNode::Leaf).collect(),
                    report,
                }
            }
            None => {
                self.logger.error(&format!(
                    "[VirtualToolGrouper] Giving up on categorizing {}, leaving {} tools uncategorized",
                    toolset.key,
                    toolset.tools.len()
                ));
                report.uncategorized = toolset.tool_names().map(str::to_string).collect();
                ToolsetOutcome {
                    nodes: toolset.tools.iter().cloned().map(ToolNode::Leaf).collect(),
                    report,
                }
            }
        };

        let r = &outcome.report;
        self.logger.info(&format!(
            "[VirtualToolGrouper] {}: {} tools -> {} groups, {} retries, {} uncategorized",
            r.toolset_key,
            r.tools_before,
            r.groups_after,
            r.retries,
            r.uncategorized.len()
        ));
        Ok(outcome)
    }

    async fn compute_categories(
        &self,
        tools: &[Tool],
        previous: Option<&[ToolCategory]>,
        cancel: &CancellationToken,
    ) -> CategorizationResult<Vec<ToolCategory>> {
        if tools.len() <= self.config.group_within_toolset {
            return Ok(vec![self.oracle.summarize_group(tools, cancel).await?]);
        }
        match previous {
            Some(previous) => {
                self.oracle
                    .divide_into_existing_groups(previous, tools, cancel)
                    .await
            }
            None => self.oracle.divide_into_groups(tools, cancel).await,
        }
    }

    /// Turn the oracle's categories into group nodes.
    ///
    /// Each tool goes to the first category naming it. Tools in the sentinel
    /// category, or in none at all, stay individually visible.
    fn build_groups(
        &self,
        toolset: &Toolset,
        categories: Vec<ToolCategory>,
        mut report: ToolsetReport,
    ) -> ToolsetOutcome {
        let sentinel = self.config.uncategorized_tools_group_name.as_str();
        let by_name: HashMap<&str, &Tool> =
            toolset.tools.iter().map(|t| (t.name.as_str(), t)).collect();
        let mut placed: HashSet<&str> = HashSet::new();

        let mut resolved: Vec<ToolCategory> = Vec::new();
        for category in categories.iter().filter(|c| c.name != sentinel) {
            let members: Vec<String> = category
                .tools
                .iter()
                .filter(|name| by_name.contains_key(name.as_str()) && placed.insert(name.as_str()))
                .cloned()
                .collect();
            if !members.is_empty() {
                resolved.push(ToolCategory {
                    tools: members,
                    ..category.clone()
                });
            }
        }

        let prefix = possible_prefix(&toolset.source);
        let mut nodes: Vec<ToolNode> = resolved
            .iter()
            .map(|category| {
                let contents = category
                    .tools
                    .iter()
                    .filter_map(|name| by_name.get(name.as_str()))
                    .map(|tool| ToolNode::Leaf((*tool).clone()))
                    .collect();
                ToolNode::Group(VirtualTool::new(
                    group_name(&category.name),
                    group_description(&category.summary),
                    contents,
                    VirtualToolMetadata {
                        toolset_key: toolset.key.clone(),
                        groups: resolved.clone(),
                        possible_prefix: prefix.clone(),
                        pre_expanded: false,
                    },
                ))
            })
            .collect();

        let uncategorized: Vec<&Tool> = toolset
            .tools
            .iter()
            .filter(|t| !placed.contains(t.name.as_str()))
            .collect();

        report.groups_after = resolved.len();
        report.uncategorized = uncategorized.iter().map(|t| t.name.clone()).collect();
        nodes.extend(uncategorized.into_iter().cloned().map(ToolNode::Leaf));

        ToolsetOutcome { nodes, report }
    }
}

impl std::fmt::Debug for VirtualToolGrouper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualToolGrouper")
            .field("config", &self.config)
            .field("embeddings", &self.embeddings.is_some())
            .finish()
    }
}

/// Append `node` under a name nothing else holds. Groups are suffixed
/// `_2`, `_3`, ... on a clash; a clashing leaf is dropped.
fn store_unique(
    slots: &mut Vec<Option<ToolNode>>,
    index: &mut HashMap<String, usize>,
    node: ToolNode,
) {
    let node = match node {
        ToolNode::Group(mut group) if index.contains_key(&group.name) => {
            group.name = free_name(index, &group.name);
            ToolNode::Group(group)
        }
        ToolNode::Leaf(tool) if index.contains_key(&tool.name) => return,
        node => node,
    };
    index.insert(node.name().to_string(), slots.len());
    slots.push(Some(node));
}

fn free_name(index: &HashMap<String, usize>, base: &str) -> String {
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|name| !index.contains_key(name))
        .unwrap_or_else(|| base.to_string())
}

/// Synthetic tool name for a category, safe for LLM tool APIs
pub fn group_name(category: &str) -> String {
    let mut name = String::from(VIRTUAL_TOOL_NAME_PREFIX);
    for c in category.trim().chars() {
        if name.len() >= MAX_TOOL_NAME_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            name.push(c.to_ascii_lowercase());
        } else {
            name.push('_');
        }
    }
    name
}

/// Description shown to the model while the group is collapsed
pub fn group_description(summary: &str) -> String {
    format!(
        "{}{}{}",
        GROUP_DESCRIPTION_HEADER,
        summary.trim(),
        GROUP_DESCRIPTION_FOOTER
    )
}
