use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use figment::providers::{Env, Format, Json};
use figment::Figment;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use super::schema::ConfigDocument;
use crate::domain::models::Config;
use crate::infrastructure::logging::LogConfig;

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "CONFIG";

/// Environment variable naming the logging configuration file
pub const LOGGING_ENV_VAR: &str = "LOGGING";

/// Directory relative file names are resolved against
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration missing: {variable} environment variable not set")]
    NotSet { variable: String },

    #[error("Configuration missing: cannot read {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration at `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    /// True when no configuration could be located at all
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::NotSet { .. } | Self::NotFound { .. })
    }

    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        let field = if err.path.is_empty() {
            "<root>".to_string()
        } else {
            err.path.join(".")
        };
        Self::invalid(field, err.kind.to_string())
    }
}

/// Loads the configuration file named by an environment variable and caches
/// the validated result.
///
/// Precedence (lowest to highest):
/// 1. Field defaults
/// 2. The JSON file named by `CONFIG`
/// 3. Prefixed environment variables, only when enabled with
///    [`ConfigLoader::with_env_overrides`]
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    env_var: String,
    env_prefix: Option<String>,
    cache: RwLock<Option<Arc<Config>>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_DIR)
    }
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            env_var: CONFIG_ENV_VAR.to_string(),
            env_prefix: None,
            cache: RwLock::new(None),
        }
    }

    /// Read the file name from `variable` instead of `CONFIG`
    #[must_use]
    pub fn with_env_var(mut self, variable: impl Into<String>) -> Self {
        self.env_var = variable.into();
        self
    }

    /// Merge `<PREFIX>SECTION__FIELD` environment variables over the file
    #[must_use]
    pub fn with_env_overrides(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Cached configuration, loading it on first use.
    ///
    /// Every call after the first successful one returns the same `Arc`
    /// until [`ConfigLoader::reset`]. Failed loads are not cached.
    pub fn get_configuration(&self) -> Result<Arc<Config>, ConfigError> {
        if let Some(config) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(config));
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have loaded while we waited for the write lock
        if let Some(config) = cache.as_ref() {
            return Ok(Arc::clone(config));
        }

        let config = Arc::new(self.load()?);
        *cache = Some(Arc::clone(&config));
        Ok(config)
    }

    /// Drop the cached configuration. Intended for tests only.
    pub fn reset(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!("configuration cache cleared");
    }

    /// Locate, read and validate the configuration, bypassing the cache
    pub fn load(&self) -> Result<Config, ConfigError> {
        let path = self.locate(&self.env_var)?;
        let content = read_file(&path)?;

        let mut figment = Figment::new().merge(Json::string(&content));
        if let Some(prefix) = &self.env_prefix {
            figment = figment.merge(Env::prefixed(prefix).split("__"));
        }
        let config = Self::extract(&figment)?;

        info!(
            path = %path.display(),
            title = %config.project.title,
            "Application configuration loaded"
        );
        Ok(config)
    }

    /// Path named by `variable`, resolved against the configuration directory
    pub fn locate(&self, variable: &str) -> Result<PathBuf, ConfigError> {
        let filename = env::var(variable)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::NotSet {
                variable: variable.to_string(),
            })?;

        // `join` keeps absolute file names as they are
        Ok(self.config_dir.join(filename))
    }

    /// Logging configuration from the file named by `LOGGING`
    pub fn load_logging_config(&self) -> Result<LogConfig, ConfigError> {
        let path = self.locate(LOGGING_ENV_VAR)?;
        let content = read_file(&path)?;
        let config: LogConfig = extract_json(&content)?;
        config
            .validate()
            .map_err(|reason| ConfigError::invalid("level", reason))?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let content = read_file(path.as_ref())?;
        Self::load_from_str(&content)
    }

    /// Load configuration from JSON text
    pub fn load_from_str(content: &str) -> Result<Config, ConfigError> {
        Self::extract(&Figment::new().merge(Json::string(content)))
    }

    fn extract(figment: &Figment) -> Result<Config, ConfigError> {
        let document: ConfigDocument = figment.extract()?;
        let config = document.into_config()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate value ranges the type system does not capture
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.url.trim().is_empty() {
            return Err(ConfigError::invalid("database.url", "must not be empty"));
        }

        if config.database.pool_size == 0 {
            return Err(ConfigError::invalid(
                "database.pool_size",
                "must be at least 1",
            ));
        }

        if config.database.pool_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "database.pool_timeout_secs",
                "must be at least 1",
            ));
        }

        if !(1..=9).contains(&config.gzip.compression_level) {
            return Err(ConfigError::invalid(
                "gzip.compression_level",
                format!("{} is outside 1-9", config.gzip.compression_level),
            ));
        }

        Ok(())
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::NotFound {
        path: path.to_path_buf(),
        source,
    })
}

fn extract_json<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    Ok(Figment::new().merge(Json::string(content)).extract()?)
}

static DEFAULT_LOADER: LazyLock<ConfigLoader> = LazyLock::new(ConfigLoader::default);

/// Process-wide configuration, loaded from `config/$CONFIG` on first use
pub fn get_configuration() -> Result<Arc<Config>, ConfigError> {
    DEFAULT_LOADER.get_configuration()
}

/// Forget the process-wide configuration. Intended for tests only.
pub fn reset_configuration() {
    DEFAULT_LOADER.reset();
}
