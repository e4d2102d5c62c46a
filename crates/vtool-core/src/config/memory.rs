//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use super::settings::GroupingConfig;
use super::traits::{ConfigProvider, ConfigResult};

/// In-memory configuration provider
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    config: RwLock<GroupingConfig>,
}

impl MemoryConfigProvider {
    /// Provider holding the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider holding `config`
    pub fn with_config(config: GroupingConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn get_config(&self) -> ConfigResult<GroupingConfig> {
        Ok(self.config.read().clone())
    }

    async fn update_config(&self, config: GroupingConfig) -> ConfigResult<()> {
        config.validate()?;
        *self.config.write() = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[tokio::test]
    async fn test_memory_config_provider() {
        let provider = MemoryConfigProvider::new();
        assert_eq!(provider.get_config().await.unwrap(), GroupingConfig::default());

        let tuned = GroupingConfig::default().with_hard_tool_limit(40).with_expand_until_count(20);
        provider.update_config(tuned.clone()).await.unwrap();
        assert_eq!(provider.get_config().await.unwrap(), tuned);

        // Invalid updates are rejected and leave the old value in place
        let invalid = GroupingConfig::default().with_hard_tool_limit(0);
        assert!(matches!(
            provider.update_config(invalid).await,
            Err(ConfigError::Invalid(_))
        ));
        assert_eq!(provider.get_config().await.unwrap().hard_tool_limit, 40);
    }
}
