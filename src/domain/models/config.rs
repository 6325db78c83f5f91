use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::placeholder::{PlaceholderError, PlaceholderResolver};

/// Validated service configuration.
///
/// Built once by the configuration loader and shared as `Arc<Config>`; there is
/// no way to mutate it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Project metadata published by the HTTP layer
    pub project: ProjectConfig,

    /// Bind address of the backend
    pub backend: BackendConfig,

    /// CORS policy
    pub cors: CorsConfig,

    /// Database engine settings
    pub database: DatabaseConfig,

    /// Static file serving
    pub static_files: StaticFilesConfig,

    /// Template rendering
    pub templates: TemplatesConfig,

    /// Response compression thresholds
    pub gzip: GzipConfig,

    /// Token validation parameters handed to the auth collaborator
    pub security: SecurityConfig,
}

/// Project metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProjectConfig {
    pub title: String,
    pub description: String,
    pub author: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub terms_of_service: Option<String>,

    #[serde(default = "default_swagger_path")]
    pub swagger_path: String,
}

pub(crate) fn default_version() -> String {
    "0.1.0".to_string()
}

pub(crate) fn default_swagger_path() -> String {
    "/docs".to_string()
}

/// Backend bind configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BackendConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix the service is mounted under behind a proxy
    #[serde(default)]
    pub root_path: String,

    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_workers() -> usize {
    4
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root_path: String::new(),
            max_workers: default_max_workers(),
        }
    }
}

impl BackendConfig {
    /// `host:port` as a single bind string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// CORS policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CorsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub allow_credentials: bool,

    #[serde(default)]
    pub allow_headers: Vec<String>,

    #[serde(default)]
    pub allow_methods: Vec<String>,

    #[serde(default)]
    pub allow_origins: Vec<String>,

    #[serde(default)]
    pub expose_headers: Vec<String>,

    /// Preflight cache lifetime in seconds
    #[serde(default = "default_max_age")]
    pub max_age: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_max_age() -> u64 {
    600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_credentials: false,
            allow_headers: vec![],
            allow_methods: vec![],
            allow_origins: vec![],
            expose_headers: vec![],
            max_age: default_max_age(),
        }
    }
}

/// Database engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Connection URL, may contain `{{VAR}}` placeholders resolved at connect time
    pub url: String,

    /// Log every statement executed through the engine
    #[serde(default)]
    pub echo: bool,

    /// Connections the pool keeps for steady-state load
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Extra connections allowed above `pool_size` under burst load
    #[serde(default = "default_max_overflow")]
    pub max_overflow: u32,

    /// Maximum wait for a free connection when leasing a session
    #[serde(default = "default_pool_timeout_secs")]
    pub pool_timeout_secs: u64,
}

pub(crate) const fn default_pool_size() -> u32 {
    5
}

pub(crate) const fn default_max_overflow() -> u32 {
    10
}

pub(crate) const fn default_pool_timeout_secs() -> u64 {
    30
}

impl DatabaseConfig {
    /// Settings for `url` with every optional field at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            echo: false,
            pool_size: default_pool_size(),
            max_overflow: default_max_overflow(),
            pool_timeout_secs: default_pool_timeout_secs(),
        }
    }

    /// Upper bound on open connections
    pub const fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow)
    }

    pub const fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }
}

/// Static file serving
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StaticFilesConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_static_directory")]
    pub directory: String,

    /// Headers added to every successful static response
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default = "default_static_name")]
    pub name: String,

    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_directory() -> String {
    "static".to_string()
}

fn default_static_name() -> String {
    "static".to_string()
}

fn default_static_path() -> String {
    "/static".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_static_directory(),
            headers: BTreeMap::new(),
            name: default_static_name(),
            path: default_static_path(),
        }
    }
}

/// Template rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TemplatesConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_templates_directory")]
    pub directory: String,

    /// Headers added to rendered HTML responses
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_templates_directory() -> String {
    "templates".to_string()
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_templates_directory(),
            headers: BTreeMap::new(),
        }
    }
}

/// Gzip response compression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GzipConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Responses smaller than this many bytes are sent uncompressed
    #[serde(default = "default_minimum_size")]
    pub minimum_size: u64,

    /// Compression level (1-9)
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

const fn default_minimum_size() -> u64 {
    1000
}

const fn default_compression_level() -> u32 {
    5
}

impl Default for GzipConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            minimum_size: default_minimum_size(),
            compression_level: default_compression_level(),
        }
    }
}

/// Token parameters consumed by the auth collaborator.
///
/// Core never validates tokens itself; it only carries these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SecurityConfig {
    /// Signing secret, may contain `{{VAR}}` placeholders
    #[serde(default)]
    pub secret_key: Option<String>,

    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: u64,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Scope name to human readable description
    #[serde(default)]
    pub scopes: BTreeMap<String, String>,
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

const fn default_access_token_expire_minutes() -> u64 {
    30
}

fn default_token_url() -> String {
    "token".to_string()
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            algorithm: default_algorithm(),
            access_token_expire_minutes: default_access_token_expire_minutes(),
            token_url: default_token_url(),
            scopes: BTreeMap::new(),
        }
    }
}

impl SecurityConfig {
    /// Secret with placeholders resolved against the current environment.
    ///
    /// Resolution happens on every call so the secret is never stored in
    /// plain form inside `Config`.
    pub fn resolved_secret_key(&self) -> Result<Option<String>, PlaceholderError> {
        self.resolved_secret_key_with(&PlaceholderResolver::from_env())
    }

    pub fn resolved_secret_key_with(
        &self,
        resolver: &PlaceholderResolver,
    ) -> Result<Option<String>, PlaceholderError> {
        self.secret_key
            .as_deref()
            .map(|secret| resolver.resolve(secret))
            .transpose()
    }

    pub const fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_expire_minutes.saturating_mul(60))
    }
}
