//! On-disk shape of the configuration file.
//!
//! Required fields are optional here so a missing one can be reported with
//! its full dotted path instead of serde's bare field name.

use serde::Deserialize;

use super::loader::ConfigError;
use crate::domain::models::config::{
    default_max_overflow, default_pool_size, default_pool_timeout_secs, default_swagger_path,
    default_version,
};
use crate::domain::models::{
    BackendConfig, Config, CorsConfig, DatabaseConfig, GzipConfig, ProjectConfig, SecurityConfig,
    StaticFilesConfig, TemplatesConfig,
};

#[derive(Debug, Default, Deserialize)]
pub(super) struct ConfigDocument {
    #[serde(default)]
    project: Option<ProjectDocument>,

    #[serde(default)]
    backend: BackendConfig,

    #[serde(default)]
    cors: CorsConfig,

    #[serde(default)]
    database: Option<DatabaseDocument>,

    #[serde(default)]
    static_files: StaticFilesConfig,

    #[serde(default)]
    templates: TemplatesConfig,

    #[serde(default)]
    gzip: GzipConfig,

    #[serde(default)]
    security: SecurityConfig,
}

#[derive(Debug, Deserialize)]
struct ProjectDocument {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    author: Option<String>,

    #[serde(default = "default_version")]
    version: String,

    #[serde(default)]
    summary: Option<String>,

    #[serde(default)]
    terms_of_service: Option<String>,

    #[serde(default = "default_swagger_path")]
    swagger_path: String,
}

impl Default for ProjectDocument {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            author: None,
            version: default_version(),
            summary: None,
            terms_of_service: None,
            swagger_path: default_swagger_path(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DatabaseDocument {
    #[serde(default)]
    url: Option<String>,

    #[serde(default)]
    echo: bool,

    #[serde(default = "default_pool_size")]
    pool_size: u32,

    #[serde(default = "default_max_overflow")]
    max_overflow: u32,

    #[serde(default = "default_pool_timeout_secs")]
    pool_timeout_secs: u64,
}

impl Default for DatabaseDocument {
    fn default() -> Self {
        Self {
            url: None,
            echo: false,
            pool_size: default_pool_size(),
            max_overflow: default_max_overflow(),
            pool_timeout_secs: default_pool_timeout_secs(),
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ConfigError> {
    value.ok_or_else(|| ConfigError::Invalid {
        field: field.to_string(),
        reason: "field required".to_string(),
    })
}

impl ConfigDocument {
    /// Check required fields and build the typed configuration.
    ///
    /// Fields are checked database first, then project, so the first error
    /// reported for an empty document is `database.url`.
    pub(super) fn into_config(self) -> Result<Config, ConfigError> {
        let database = self.database.unwrap_or_default();
        let database = DatabaseConfig {
            url: required(database.url, "database.url")?,
            echo: database.echo,
            pool_size: database.pool_size,
            max_overflow: database.max_overflow,
            pool_timeout_secs: database.pool_timeout_secs,
        };

        let project = self.project.unwrap_or_default();
        let project = ProjectConfig {
            title: required(project.title, "project.title")?,
            description: required(project.description, "project.description")?,
            author: required(project.author, "project.author")?,
            version: project.version,
            summary: project.summary,
            terms_of_service: project.terms_of_service,
            swagger_path: project.swagger_path,
        };

        Ok(Config {
            project,
            backend: self.backend,
            cors: self.cors,
            database,
            static_files: self.static_files,
            templates: self.templates,
            gzip: self.gzip,
            security: self.security,
        })
    }
}
