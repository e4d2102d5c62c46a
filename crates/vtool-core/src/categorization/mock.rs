//! Mock categorization oracle for testing
//!
//! Groups tools deterministically by the first `_`-separated segment of their
//! name, so `github_list_issues` and `github_create_pr` land in `github`.
//! Failures and cancellation can be scripted.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{CategorizationError, CategorizationResult};
use super::traits::{CategorizationOracle, ToolCategory};
use crate::types::{CancellationToken, Tool};

/// Which oracle entry point was used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOracleCallKind {
    Summarize,
    Divide,
    DivideExisting,
}

/// Recorded oracle invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockOracleCall {
    pub kind: MockOracleCallKind,
    pub tools: Vec<String>,
}

/// Failure behaviour
#[derive(Debug, Clone, Default)]
pub enum MockOracleMode {
    /// Always answer
    #[default]
    Answer,
    /// Fail the first `n` calls, then answer
    FailTimes(usize),
    /// Fail every call
    AlwaysFail,
    /// Report cancellation on every call
    Cancelled,
}

/// Deterministic oracle stand-in
pub struct MockOracle {
    mode: MockOracleMode,
    uncategorized_name: String,
    uncategorized_tools: HashSet<String>,
    failures: AtomicUsize,
    calls: Mutex<Vec<MockOracleCall>>,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOracle {
    /// Oracle that always answers
    pub fn new() -> Self {
        Self::with_mode(MockOracleMode::Answer)
    }

    pub fn with_mode(mode: MockOracleMode) -> Self {
        Self {
            mode,
            uncategorized_name: "uncategorized".to_string(),
            uncategorized_tools: HashSet::new(),
            failures: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Oracle whose every call fails
    pub fn failing() -> Self {
        Self::with_mode(MockOracleMode::AlwaysFail)
    }

    /// Put these tools into the uncategorized sentinel group
    pub fn with_uncategorized(
        mut self,
        sentinel: impl Into<String>,
        tools: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.uncategorized_name = sentinel.into();
        self.uncategorized_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<MockOracleCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls that failed
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    fn record(&self, kind: MockOracleCallKind, tools: &[Tool]) -> CategorizationResult<()> {
        let index = {
            let mut calls = self.calls.lock();
            calls.push(MockOracleCall {
                kind,
                tools: tools.iter().map(|t| t.name.clone()).collect(),
            });
            calls.len() - 1
        };

        let fail = match &self.mode {
            MockOracleMode::Answer => false,
            MockOracleMode::FailTimes(n) => index < *n,
            MockOracleMode::AlwaysFail => true,
            MockOracleMode::Cancelled => return Err(CategorizationError::Cancelled),
        };
        if fail {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(CategorizationError::oracle(format!(
                "mock failure on call {}",
                index + 1
            )));
        }
        Ok(())
    }

    fn group_key(tool: &Tool) -> String {
        tool.name
            .split('_')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("misc")
            .to_string()
    }

    fn group_by_name(&self, tools: &[Tool], mut groups: Vec<ToolCategory>) -> Vec<ToolCategory> {
        let mut uncategorized = Vec::new();
        for tool in tools {
            if self.uncategorized_tools.contains(&tool.name) {
                uncategorized.push(tool.name.clone());
                continue;
            }
            let key = Self::group_key(tool);
            match groups.iter_mut().find(|g| g.name == key) {
                Some(group) => group.tools.push(tool.name.clone()),
                None => groups.push(ToolCategory::new(
                    key.clone(),
                    format!("Tools for working with {}", key),
                    [tool.name.clone()],
                )),
            }
        }
        if !uncategorized.is_empty() {
            groups.push(ToolCategory::new(
                self.uncategorized_name.clone(),
                "",
                uncategorized,
            ));
        }
        groups
    }

    fn check_cancel(cancel: &CancellationToken) -> CategorizationResult<()> {
        if cancel.is_cancelled() {
            Err(CategorizationError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CategorizationOracle for MockOracle {
    async fn summarize_group(
        &self,
        tools: &[Tool],
        cancel: &CancellationToken,
    ) -> CategorizationResult<ToolCategory> {
        Self::check_cancel(cancel)?;
        self.record(MockOracleCallKind::Summarize, tools)?;

        let first = tools
            .first()
            .ok_or_else(|| CategorizationError::invalid_response("no tools to summarize"))?;
        let key = Self::group_key(first);
        Ok(ToolCategory::new(
            key.clone(),
            format!("Tools for working with {}", key),
            tools.iter().map(|t| t.name.clone()),
        ))
    }

    async fn divide_into_groups(
        &self,
        tools: &[Tool],
        cancel: &CancellationToken,
    ) -> CategorizationResult<Vec<ToolCategory>> {
        Self::check_cancel(cancel)?;
        self.record(MockOracleCallKind::Divide, tools)?;
        Ok(self.group_by_name(tools, Vec::new()))
    }

    async fn divide_into_existing_groups(
        &self,
        previous: &[ToolCategory],
        tools: &[Tool],
        cancel: &CancellationToken,
    ) -> CategorizationResult<Vec<ToolCategory>> {
        Self::check_cancel(cancel)?;
        self.record(MockOracleCallKind::DivideExisting, tools)?;

        // Keep previous placements, group only the newcomers.
        let mut placed = HashSet::new();
        let kept: Vec<ToolCategory> = previous
            .iter()
            .filter(|g| g.name != self.uncategorized_name)
            .map(|g| {
                let members: Vec<String> = g
                    .tools
                    .iter()
                    .filter(|name| tools.iter().any(|t| &t.name == *name))
                    .cloned()
                    .collect();
                placed.extend(members.iter().cloned());
                ToolCategory::new(g.name.clone(), g.summary.clone(), members)
            })
            .filter(|g| !g.tools.is_empty())
            .collect();

        let newcomers: Vec<Tool> = tools
            .iter()
            .filter(|t| !placed.contains(&t.name))
            .cloned()
            .collect();
        Ok(self.group_by_name(&newcomers, kept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools(names: &[&str]) -> Vec<Tool> {
        names.iter().map(|n| Tool::new(*n, "")).collect()
    }

    #[tokio::test]
    async fn test_divide_groups_by_prefix() {
        let oracle = MockOracle::new();
        let groups = oracle
            .divide_into_groups(
                &tools(&["git_status", "git_commit", "jira_search"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "git");
        assert_eq!(groups[0].tools, vec!["git_status", "git_commit"]);
        assert_eq!(oracle.calls()[0].kind, MockOracleCallKind::Divide);
    }

    #[tokio::test]
    async fn test_existing_groups_are_kept() {
        let oracle = MockOracle::new();
        let previous = vec![ToolCategory::new(
            "source_control",
            "Git",
            ["git_status", "git_removed"],
        )];
        let groups = oracle
            .divide_into_existing_groups(
                &previous,
                &tools(&["git_status", "jira_search"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(groups[0].name, "source_control");
        assert_eq!(groups[0].tools, vec!["git_status"]);
        assert_eq!(groups[1].name, "jira");
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let oracle = MockOracle::with_mode(MockOracleMode::FailTimes(1));
        let cancel = CancellationToken::new();
        let list = tools(&["a_b"]);

        assert!(oracle.summarize_group(&list, &cancel).await.is_err());
        assert!(oracle.summarize_group(&list, &cancel).await.is_ok());
        assert_eq!(oracle.failure_count(), 1);

        let cancelled = MockOracle::with_mode(MockOracleMode::Cancelled);
        let err = cancelled.summarize_group(&list, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_uncategorized_sentinel() {
        let oracle = MockOracle::new().with_uncategorized("misc_tools", ["odd_one"]);
        let groups = oracle
            .divide_into_groups(&tools(&["git_status", "odd_one"]), &CancellationToken::new())
            .await
            .unwrap();

        let sentinel = groups.iter().find(|g| g.name == "misc_tools").unwrap();
        assert_eq!(sentinel.tools, vec!["odd_one"]);
    }
}
