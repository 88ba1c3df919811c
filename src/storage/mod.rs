//! Storage for configuration and the on-disk credential sources.

pub mod config;
pub mod opencode_db;
pub mod paths;

pub use config::{
    Config, ConfigSource, ConfigSources, ENV_CONFIG, ENV_FORMAT, ENV_PRETTY, ENV_TIMEOUT,
    ResolvedConfig,
};
pub use paths::AppPaths;
