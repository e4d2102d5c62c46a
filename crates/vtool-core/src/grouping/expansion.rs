//! Expansion passes run after the tree is assembled, and the collapse pass
//! that keeps the tree under the hard limit
//!
//! Groups are addressed by their index path from the root, since names are
//! only unique within one `contents` list.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::logging::Logger;
use crate::types::{ToolNode, VirtualTool};

/// Index path from the root to a group
type GroupPath = Vec<usize>;

/// Every group the model can see or has opened, with its path
fn visible_groups(root: &VirtualTool) -> Vec<(GroupPath, &VirtualTool)> {
    fn walk<'a>(
        nodes: &'a [ToolNode],
        path: &mut GroupPath,
        out: &mut Vec<(GroupPath, &'a VirtualTool)>,
    ) {
        for (index, node) in nodes.iter().enumerate() {
            if let ToolNode::Group(group) = node {
                path.push(index);
                out.push((path.clone(), group));
                if group.is_expanded {
                    walk(&group.contents, path, out);
                }
                path.pop();
            }
        }
    }

    let mut out = Vec::new();
    walk(&root.contents, &mut Vec::new(), &mut out);
    out
}

/// Collapsed groups the model can currently see
fn visible_collapsed_groups(root: &VirtualTool) -> impl Iterator<Item = (GroupPath, &VirtualTool)> {
    visible_groups(root)
        .into_iter()
        .filter(|(_, group)| !group.is_expanded)
}

fn group_at_mut<'a>(root: &'a mut VirtualTool, path: &[usize]) -> Option<&'a mut VirtualTool> {
    let mut group = root;
    for &index in path {
        group = group.contents.get_mut(index)?.as_group_mut()?;
    }
    Some(group)
}

/// Expand the group at `path`, returning the new visible count, unless that
/// would exceed `hard_limit`
fn try_expand(
    root: &mut VirtualTool,
    path: &[usize],
    visible: usize,
    hard_limit: usize,
    pre_expanded: bool,
) -> Option<usize> {
    let group = group_at_mut(root, path)?;
    if group.is_expanded {
        return None;
    }
    let next = visible - 1 + group.tools().count();
    if next > hard_limit {
        return None;
    }
    group.is_expanded = true;
    group.metadata.pre_expanded = pre_expanded;
    Some(next)
}

/// Budget expansions go first, then the least recently used
fn collapse_order(a: &VirtualTool, b: &VirtualTool) -> Ordering {
    let key = |g: &VirtualTool| (!g.metadata.pre_expanded, g.last_used_on_turn);
    key(a).cmp(&key(b)).then_with(|| a.name.cmp(&b.name))
}

/// Collapse expanded groups until no more than `hard_limit` items are
/// visible, returning the collapsed names in order.
///
/// Stops early only when nothing expanded is left; the top level alone may
/// still exceed the limit.
pub(crate) fn collapse_to_limit(root: &mut VirtualTool, hard_limit: usize) -> Vec<String> {
    let mut collapsed = Vec::new();
    while root.visible_count() > hard_limit {
        let victim = visible_groups(root)
            .into_iter()
            .filter(|(_, group)| group.is_expanded)
            .min_by(|(_, a), (_, b)| collapse_order(a, b))
            .map(|(path, group)| (path, group.name.clone()));
        let Some((path, name)) = victim else {
            break;
        };
        let Some(group) = group_at_mut(root, &path) else {
            break;
        };
        group.is_expanded = false;
        group.metadata.pre_expanded = false;
        collapsed.push(name);
    }
    collapsed
}

/// Expand groups holding tools predicted relevant to the query.
///
/// `predicted` is in priority order. Groups are expanded by the best-ranked
/// tool they contain; the pass stops at the first group that does not fit.
pub(crate) fn expand_for_query(
    root: &mut VirtualTool,
    predicted: &[String],
    hard_limit: usize,
    logger: &dyn Logger,
) -> Vec<String> {
    if predicted.is_empty() {
        return Vec::new();
    }

    let rank: HashMap<&str, usize> = predicted
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut candidates: Vec<(usize, GroupPath, String)> = visible_collapsed_groups(root)
        .filter_map(|(path, group)| {
            group
                .leaf_names()
                .into_iter()
                .filter_map(|name| rank.get(name).copied())
                .min()
                .map(|best| (best, path, group.name.clone()))
        })
        .collect();
    candidates.sort_by_key(|(best, _, _)| *best);

    let mut expanded = Vec::new();
    for (best, path, name) in candidates {
        let visible = root.visible_count();
        match try_expand(root, &path, visible, hard_limit, false) {
            Some(next) => {
                logger.debug(&format!(
                    "[VirtualToolGrouper] Expanded {} for query (predicted rank {}), {} visible",
                    name, best, next
                ));
                expanded.push(name);
            }
            None => {
                logger.debug(&format!(
                    "[VirtualToolGrouper] Stopping query expansion at {}: hard limit {}",
                    name, hard_limit
                ));
                break;
            }
        }
    }
    expanded
}

/// Expand the smallest groups until `expand_until` items are visible.
///
/// Skipped entirely when the tree already shows more than `expand_until`.
pub(crate) fn expand_to_budget(
    root: &mut VirtualTool,
    expand_until: usize,
    hard_limit: usize,
    logger: &dyn Logger,
) -> Vec<String> {
    let mut visible = root.visible_count();
    if visible > expand_until {
        return Vec::new();
    }

    let mut candidates: Vec<(usize, GroupPath, String)> = visible_collapsed_groups(root)
        .map(|(path, group)| (group.tools().count(), path, group.name.clone()))
        .collect();
    candidates.sort_by_key(|(size, _, _)| *size);

    let mut expanded = Vec::new();
    for (_, path, name) in candidates {
        if visible >= expand_until {
            break;
        }
        match try_expand(root, &path, visible, hard_limit, true) {
            Some(next) => {
                visible = next;
                expanded.push(name);
            }
            None => break,
        }
    }

    if !expanded.is_empty() {
        logger.debug(&format!(
            "[VirtualToolGrouper] Pre-expanded {} groups, {} visible",
            expanded.len(),
            visible
        ));
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::{Tool, VirtualToolMetadata};

    fn group(name: &str, size: usize) -> ToolNode {
        let contents = (0..size)
            .map(|i| ToolNode::Leaf(Tool::new(format!("{}_{}", name, i), "")))
            .collect();
        ToolNode::Group(VirtualTool::new(
            format!("activate_{}", name),
            "",
            contents,
            VirtualToolMetadata::default(),
        ))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_query_expansion_orders_by_best_prediction() {
        let mut root = VirtualTool::root(vec![group("a", 3), group("b", 3), group("c", 3)]);

        let expanded = expand_for_query(
            &mut root,
            &names(&["c_1", "a_0", "c_2"]),
            100,
            &NoOpLogger,
        );

        assert_eq!(expanded, names(&["activate_c", "activate_a"]));
        assert_eq!(root.visible_count(), 7);
        let a = root.find("activate_a").and_then(ToolNode::as_group).unwrap();
        assert!(a.is_expanded);
        assert!(!a.metadata.pre_expanded);
    }

    #[test]
    fn test_query_expansion_respects_hard_limit() {
        let mut root = VirtualTool::root(vec![group("a", 4), group("b", 4)]);

        // 2 visible; expanding a -> 5, expanding b too -> 8
        let expanded = expand_for_query(&mut root, &names(&["a_0", "b_0"]), 6, &NoOpLogger);

        assert_eq!(expanded, names(&["activate_a"]));
        assert_eq!(root.visible_count(), 5);
    }

    #[test]
    fn test_budget_expands_smallest_first() {
        let mut root = VirtualTool::root(vec![group("big", 5), group("small", 2), group("mid", 3)]);

        // 3 visible; small -> 4, mid -> 6, stop (>= 6)
        let expanded = expand_to_budget(&mut root, 6, 20, &NoOpLogger);

        assert_eq!(expanded, names(&["activate_small", "activate_mid"]));
        assert_eq!(root.visible_count(), 6);
        let small = root.find("activate_small").and_then(ToolNode::as_group).unwrap();
        assert!(small.metadata.pre_expanded);
    }

    #[test]
    fn test_budget_never_passes_hard_limit() {
        let mut root = VirtualTool::root(vec![group("a", 4), group("b", 10)]);

        let expanded = expand_to_budget(&mut root, 15, 12, &NoOpLogger);

        assert_eq!(expanded, names(&["activate_a"]));
        assert_eq!(root.visible_count(), 5);
    }

    #[test]
    fn test_budget_skipped_when_already_over_threshold() {
        let mut root = VirtualTool::root(vec![group("a", 2), group("b", 2), group("c", 2)]);
        assert!(expand_to_budget(&mut root, 2, 10, &NoOpLogger).is_empty());
        assert_eq!(root.visible_count(), 3);
    }

    #[test]
    fn test_expansion_targets_the_visible_group() {
        // A collapsed group hides a nested group with the same name
        let hidden = group("dup", 1);
        let outer = ToolNode::Group(VirtualTool::new(
            "activate_outer",
            "",
            vec![hidden],
            VirtualToolMetadata::default(),
        ));
        let mut root = VirtualTool::root(vec![outer, group("dup", 3)]);

        let expanded = expand_to_budget(&mut root, 10, 20, &NoOpLogger);

        assert_eq!(expanded, names(&["activate_outer", "activate_dup"]));
        let top = root.contents[1].as_group().unwrap();
        assert!(top.is_expanded);
        let nested = root.contents[0].as_group().unwrap().contents[0].as_group().unwrap();
        assert!(!nested.is_expanded);
        assert_eq!(root.visible_count(), 4);
    }

    #[test]
    fn test_collapse_prefers_budget_then_oldest() {
        let mut root = VirtualTool::root(vec![group("budget", 4), group("old", 4), group("new", 4)]);
        for node in &mut root.contents {
            let g = node.as_group_mut().unwrap();
            g.is_expanded = true;
        }
        root.contents[0].as_group_mut().unwrap().metadata.pre_expanded = true;
        root.contents[0].as_group_mut().unwrap().last_used_on_turn = Some(9);
        root.contents[1].as_group_mut().unwrap().last_used_on_turn = Some(1);
        root.contents[2].as_group_mut().unwrap().last_used_on_turn = Some(5);

        // 12 visible; budget -> 9, old -> 6
        let collapsed = collapse_to_limit(&mut root, 6);

        assert_eq!(collapsed, names(&["activate_budget", "activate_old"]));
        assert_eq!(root.visible_count(), 6);
        assert!(!root.contents[0].as_group().unwrap().metadata.pre_expanded);
    }

    #[test]
    fn test_collapse_stops_when_nothing_is_expanded() {
        let mut root = VirtualTool::root((0..5).map(|i| group(&format!("g{}", i), 2)).collect());
        assert!(collapse_to_limit(&mut root, 3).is_empty());
        assert_eq!(root.visible_count(), 5);
    }
}
