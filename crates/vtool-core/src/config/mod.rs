//! Grouping configuration
//!
//! Supports multiple configuration sources:
//! - `MemoryConfigProvider`: In-memory for hosts and tests
//! - `FileConfigProvider`: YAML file-based (user/workspace level)

mod file;
mod memory;
mod settings;
mod traits;

pub use file::{ConfigLevel, FileConfigProvider};
pub use memory::MemoryConfigProvider;
pub use settings::GroupingConfig;
pub use traits::{ConfigError, ConfigProvider, ConfigResult};
