//! Configuration management infrastructure
//!
//! Loads the JSON configuration file named by `CONFIG` using figment:
//! - Field defaults via serde
//! - Required-field and range validation with dotted field paths
//! - Optional environment variable overrides
//! - Process-wide memoization with an explicit reset

pub mod loader;
mod schema;

pub use loader::{
    get_configuration, reset_configuration, ConfigError, ConfigLoader,
    CONFIG_ENV_VAR, DEFAULT_CONFIG_DIR, LOGGING_ENV_VAR,
};
