//! Virtual tool tree
//!
//! A virtual tool is a synthetic, collapsible group standing in for a set of
//! related tools. While collapsed the model sees only the group; once
//! expanded the group disappears and its children become visible.

use serde::{Deserialize, Serialize};

use super::tool::Tool;
use crate::categorization::ToolCategory;

/// Prefix marking a name as synthetic so it cannot collide with a real tool
pub const VIRTUAL_TOOL_NAME_PREFIX: &str = "activate_";

/// Bookkeeping attached to a group node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualToolMetadata {
    /// Toolset the group was built from (`ext_*`, `mcp_*`)
    pub toolset_key: String,
    /// Categorization result that produced this node
    #[serde(default)]
    pub groups: Vec<ToolCategory>,
    /// Fallback disambiguator used when two groups share a name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_prefix: Option<String>,
    /// Whether the engine expanded the group to fill the tool budget
    #[serde(default)]
    pub pre_expanded: bool,
}

/// Group node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualTool {
    pub name: String,
    pub description: String,
    pub contents: Vec<ToolNode>,
    #[serde(default)]
    pub is_expanded: bool,
    #[serde(default)]
    pub metadata: VirtualToolMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_on_turn: Option<u32>,
}

/// A child in the tree: either another group or a real tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ToolNode {
    Group(VirtualTool),
    Leaf(Tool),
}

impl ToolNode {
    pub fn name(&self) -> &str {
        match self {
            ToolNode::Group(group) => &group.name,
            ToolNode::Leaf(tool) => &tool.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ToolNode::Group(group) => &group.description,
            ToolNode::Leaf(tool) => &tool.description,
        }
    }

    pub fn as_group(&self) -> Option<&VirtualTool> {
        match self {
            ToolNode::Group(group) => Some(group),
            ToolNode::Leaf(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut VirtualTool> {
        match self {
            ToolNode::Group(group) => Some(group),
            ToolNode::Leaf(_) => None,
        }
    }
}

impl From<Tool> for ToolNode {
    fn from(tool: Tool) -> Self {
        ToolNode::Leaf(tool)
    }
}

impl From<VirtualTool> for ToolNode {
    fn from(group: VirtualTool) -> Self {
        ToolNode::Group(group)
    }
}

impl VirtualTool {
    /// Create a collapsed group
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        contents: Vec<ToolNode>,
        metadata: VirtualToolMetadata,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            contents,
            is_expanded: false,
            metadata,
            last_used_on_turn: None,
        }
    }

    /// Create the root container for a whole tool inventory
    pub fn root(contents: Vec<ToolNode>) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            contents,
            is_expanded: true,
            metadata: VirtualToolMetadata::default(),
            last_used_on_turn: None,
        }
    }

    /// Depth-first traversal over every node and leaf below this one
    pub fn all(&self) -> AllNodes<'_> {
        AllNodes {
            stack: vec![self.contents.iter()],
        }
    }

    /// Items the model sees: leaves reachable through expanded groups plus
    /// collapsed groups as single opaque entries
    pub fn tools(&self) -> VisibleNodes<'_> {
        VisibleNodes {
            stack: vec![self.contents.iter()],
        }
    }

    /// Number of entries `tools()` yields
    pub fn visible_count(&self) -> usize {
        self.tools().count()
    }

    /// Copy of this group under a disambiguated name.
    ///
    /// The prefix goes after the synthetic marker, so `activate_issues`
    /// with prefix `github_` becomes `activate_github_issues`.
    pub fn clone_with_prefix(&self, prefix: &str) -> VirtualTool {
        let name = match self.name.strip_prefix(VIRTUAL_TOOL_NAME_PREFIX) {
            Some(rest) => format!("{}{}{}", VIRTUAL_TOOL_NAME_PREFIX, prefix, rest),
            None => format!("{}{}", prefix, self.name),
        };
        VirtualTool {
            name,
            ..self.clone()
        }
    }

    /// Find a node anywhere below this one by name
    pub fn find(&self, name: &str) -> Option<&ToolNode> {
        self.all().find(|node| node.name() == name)
    }

    pub fn find_group(&self, name: &str) -> Option<&VirtualTool> {
        self.find(name).and_then(ToolNode::as_group)
    }

    /// Find a group anywhere below this one by name
    pub fn find_group_mut(&mut self, name: &str) -> Option<&mut VirtualTool> {
        for node in &mut self.contents {
            if let ToolNode::Group(group) = node {
                if group.name == name {
                    return Some(group);
                }
                if let Some(found) = group.find_group_mut(name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Find a group the model can reach by name: direct children first, then
    /// inside expanded groups. Groups hidden in a collapsed group are skipped.
    pub fn visible_group_mut(&mut self, name: &str) -> Option<&mut VirtualTool> {
        let direct = self
            .contents
            .iter()
            .position(|node| matches!(node, ToolNode::Group(group) if group.name == name));
        if let Some(index) = direct {
            return self.contents[index].as_group_mut();
        }
        self.contents
            .iter_mut()
            .filter_map(ToolNode::as_group_mut)
            .filter(|group| group.is_expanded)
            .find_map(|group| group.visible_group_mut(name))
    }

    /// Innermost group whose direct children include the tool `tool_name`
    pub fn parent_of_mut(&mut self, tool_name: &str) -> Option<&mut VirtualTool> {
        let direct = self
            .contents
            .iter()
            .any(|node| matches!(node, ToolNode::Leaf(tool) if tool.name == tool_name));
        if direct {
            return Some(self);
        }
        self.contents
            .iter_mut()
            .filter_map(ToolNode::as_group_mut)
            .find_map(|group| group.parent_of_mut(tool_name))
    }

    /// Whether a real tool with this name lives anywhere below this node
    pub fn contains_tool(&self, name: &str) -> bool {
        self.all()
            .any(|node| matches!(node, ToolNode::Leaf(tool) if tool.name == name))
    }

    /// Names of every real tool below this node, in traversal order
    pub fn leaf_names(&self) -> Vec<&str> {
        self.all()
            .filter_map(|node| match node {
                ToolNode::Leaf(tool) => Some(tool.name.as_str()),
                ToolNode::Group(_) => None,
            })
            .collect()
    }

    /// Apply `f` to every group below this node, parents before children
    pub fn for_each_group_mut(&mut self, f: &mut impl FnMut(&mut VirtualTool)) {
        for node in &mut self.contents {
            if let ToolNode::Group(group) = node {
                f(group);
                group.for_each_group_mut(f);
            }
        }
    }
}

/// Iterator returned by [`VirtualTool::all`]
pub struct AllNodes<'a> {
    stack: Vec<std::slice::Iter<'a, ToolNode>>,
}

impl<'a> Iterator for AllNodes<'a> {
    type Item = &'a ToolNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(iter) = self.stack.last_mut() {
            match iter.next() {
                Some(node) => {
                    if let ToolNode::Group(group) = node {
                        self.stack.push(group.contents.iter());
                    }
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

/// Iterator returned by [`VirtualTool::tools`]
pub struct VisibleNodes<'a> {
    stack: Vec<std::slice::Iter<'a, ToolNode>>,
}

impl<'a> Iterator for VisibleNodes<'a> {
    type Item = &'a ToolNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(iter) = self.stack.last_mut() {
            match iter.next() {
                Some(ToolNode::Group(group)) if group.is_expanded => {
                    self.stack.push(group.contents.iter());
                }
                Some(node) => return Some(node),
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}
