//! Grouping thresholds and feature flags

use serde::{Deserialize, Serialize};

use super::traits::{ConfigError, ConfigResult};

/// Tunables for the virtual tool grouper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupingConfig {
    /// Below this many tools nothing is grouped
    pub start_grouping_after_tool_count: usize,
    /// Toolsets this small are passed through untouched
    pub min_toolset_size_to_group: usize,
    /// Toolsets up to this size become a single summarized group
    pub group_within_toolset: usize,
    /// Oracle attempts per toolset before failing open
    pub max_categorization_retries: usize,
    /// Sentinel category name for tools the oracle could not place
    pub uncategorized_tools_group_name: String,
    /// Budget-driven expansion stops once this many items are visible
    pub expand_until_count: usize,
    /// Never show the model more than this many items
    pub hard_tool_limit: usize,
    /// Expand groups predicted relevant to the query via embeddings
    pub embeddings_expansion_enabled: bool,
    /// How many query-relevant tools to predict
    pub predicted_tool_count: usize,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            start_grouping_after_tool_count: 64,
            min_toolset_size_to_group: 2,
            group_within_toolset: 16,
            max_categorization_retries: 3,
            uncategorized_tools_group_name: "uncategorized".to_string(),
            expand_until_count: 64,
            hard_tool_limit: 128,
            embeddings_expansion_enabled: false,
            predicted_tool_count: 10,
        }
    }
}

impl GroupingConfig {
    pub fn with_hard_tool_limit(mut self, limit: usize) -> Self {
        self.hard_tool_limit = limit;
        self
    }

    pub fn with_expand_until_count(mut self, count: usize) -> Self {
        self.expand_until_count = count;
        self
    }

    pub fn with_start_grouping_after(mut self, count: usize) -> Self {
        self.start_grouping_after_tool_count = count;
        self
    }

    pub fn with_embeddings_expansion(mut self, enabled: bool) -> Self {
        self.embeddings_expansion_enabled = enabled;
        self
    }

    /// Reject combinations the grouper cannot honour
    pub fn validate(&self) -> ConfigResult<()> {
        if self.hard_tool_limit == 0 {
            return Err(ConfigError::Invalid("hardToolLimit must be positive".into()));
        }
        if self.expand_until_count > self.hard_tool_limit {
            return Err(ConfigError::Invalid(format!(
                "expandUntilCount ({}) exceeds hardToolLimit ({})",
                self.expand_until_count, self.hard_tool_limit
            )));
        }
        if self.max_categorization_retries == 0 {
            return Err(ConfigError::Invalid(
                "maxCategorizationRetries must be at least 1".into(),
            ));
        }
        if self.uncategorized_tools_group_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "uncategorizedToolsGroupName must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GroupingConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.expand_until_count <= config.hard_tool_limit);
        assert!(!config.embeddings_expansion_enabled);
    }

    #[test]
    fn test_validation_failures() {
        let too_eager = GroupingConfig::default()
            .with_hard_tool_limit(10)
            .with_expand_until_count(20);
        assert!(matches!(too_eager.validate(), Err(ConfigError::Invalid(_))));

        let no_limit = GroupingConfig::default().with_hard_tool_limit(0);
        assert!(no_limit.validate().is_err());

        let no_retries = GroupingConfig {
            max_categorization_retries: 0,
            ..Default::default()
        };
        assert!(no_retries.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: GroupingConfig =
            serde_yaml::from_str("hardToolLimit: 40\nembeddingsExpansionEnabled: true\n").unwrap();
        assert_eq!(config.hard_tool_limit, 40);
        assert!(config.embeddings_expansion_enabled);
        assert_eq!(config.max_categorization_retries, 3);
    }
}
