//! Partitioning tools by contributing source

use crate::types::{Tool, ToolSource};

/// Key of the builtin toolset, which is never categorized
pub const BUILTIN_TOOLSET_KEY: &str = "builtin";

const POSSIBLE_PREFIX_MAX_LEN: usize = 10;

/// Tools sharing one contributing source
#[derive(Debug, Clone)]
pub struct Toolset {
    pub key: String,
    pub source: ToolSource,
    pub tools: Vec<Tool>,
}

impl Toolset {
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }
}

/// `ext_<id>`, `mcp_<label>` or `builtin`
pub fn toolset_key(source: &ToolSource) -> String {
    match source {
        ToolSource::Builtin => BUILTIN_TOOLSET_KEY.to_string(),
        ToolSource::Extension { id } => format!("ext_{}", id),
        ToolSource::Mcp { label } => format!("mcp_{}", label),
    }
}

/// Short disambiguator for groups of this source.
///
/// Extensions use the second dot-segment of their id (`ms-python.python` →
/// `python_`), servers their label. Only ASCII alphanumerics survive.
pub fn possible_prefix(source: &ToolSource) -> Option<String> {
    let raw = match source {
        ToolSource::Builtin => return None,
        ToolSource::Extension { id } => id.split('.').nth(1).unwrap_or(id),
        ToolSource::Mcp { label } => label.as_str(),
    };

    let sanitized: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(POSSIBLE_PREFIX_MAX_LEN)
        .collect::<String>()
        .to_ascii_lowercase();

    if sanitized.is_empty() {
        None
    } else {
        Some(format!("{}_", sanitized))
    }
}

/// Split `tools` into builtin tools and per-source toolsets.
///
/// Toolsets keep the order in which their first tool appeared, and tools keep
/// their input order within a toolset.
pub fn partition(tools: Vec<Tool>) -> (Vec<Tool>, Vec<Toolset>) {
    let mut builtin = Vec::new();
    let mut toolsets: Vec<Toolset> = Vec::new();

    for tool in tools {
        if tool.source.is_builtin() {
            builtin.push(tool);
            continue;
        }
        let key = toolset_key(&tool.source);
        match toolsets.iter_mut().find(|ts| ts.key == key) {
            Some(toolset) => toolset.tools.push(tool),
            None => toolsets.push(Toolset {
                key,
                source: tool.source.clone(),
                tools: vec![tool],
            }),
        }
    }

    (builtin, toolsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str, source: ToolSource) -> Tool {
        Tool::new(name, "").with_source(source)
    }

    #[test]
    fn test_keys() {
        assert_eq!(toolset_key(&ToolSource::Builtin), "builtin");
        assert_eq!(toolset_key(&ToolSource::extension("ms-python.python")), "ext_ms-python.python");
        assert_eq!(toolset_key(&ToolSource::mcp("github")), "mcp_github");
    }

    #[test]
    fn test_possible_prefix() {
        assert_eq!(
            possible_prefix(&ToolSource::extension("ms-python.python")),
            Some("python_".to_string())
        );
        assert_eq!(
            possible_prefix(&ToolSource::extension("standalone")),
            Some("standalone_".to_string())
        );
        assert_eq!(
            possible_prefix(&ToolSource::mcp("My Server (prod) v2 extra")),
            Some("myserverpr_".to_string())
        );
        assert_eq!(possible_prefix(&ToolSource::mcp("---")), None);
        assert_eq!(possible_prefix(&ToolSource::Builtin), None);
    }

    #[test]
    fn test_partition_preserves_order() {
        let tools = vec![
            tool("read_file", ToolSource::Builtin),
            tool("gh_a", ToolSource::mcp("github")),
            tool("py_a", ToolSource::extension("ms-python.python")),
            tool("gh_b", ToolSource::mcp("github")),
            tool("run", ToolSource::Builtin),
        ];

        let (builtin, toolsets) = partition(tools);

        assert_eq!(builtin.len(), 2);
        assert_eq!(toolsets.len(), 2);
        assert_eq!(toolsets[0].key, "mcp_github");
        assert_eq!(toolsets[0].tool_names().collect::<Vec<_>>(), vec!["gh_a", "gh_b"]);
        assert_eq!(toolsets[1].key, "ext_ms-python.python");
    }
}
