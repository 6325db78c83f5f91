pub mod config;

pub use config::{
    BackendConfig, Config, CorsConfig, DatabaseConfig, GzipConfig, ProjectConfig,
    SecurityConfig, StaticFilesConfig, TemplatesConfig,
};
