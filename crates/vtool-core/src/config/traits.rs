//! Configuration provider trait

use async_trait::async_trait;

use super::settings::GroupingConfig;

/// Configuration provider abstraction
///
/// Implementations:
/// - `MemoryConfigProvider`: In-memory, pushed by the host or tests
/// - `FileConfigProvider`: YAML file (~/.config/openllm/virtual-tools.yaml)
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Current grouping configuration
    async fn get_config(&self) -> ConfigResult<GroupingConfig>;

    /// Replace the grouping configuration
    async fn update_config(&self, config: GroupingConfig) -> ConfigResult<()>;
}

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("Configuration error: {0}")]
    Other(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
