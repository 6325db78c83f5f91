//! Backend Core - configuration and database plumbing for a web service
//!
//! Loads a JSON configuration file named by an environment variable, resolves
//! `{{VAR}}` placeholders against the process environment, and owns a pooled
//! SQLite engine whose lifetime follows the host's start and stop hooks.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): configuration model, placeholder resolution, ports
//! - **Application Layer** (`application`): startup and shutdown orchestration
//! - **Infrastructure Layer** (`infrastructure`): config loading, database, logging
//!
//! # Example
//!
//! ```ignore
//! use backend_core::{Application, ConfigLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let loader = ConfigLoader::default();
//!     let _logger = Application::setup_logging(&loader)?;
//!     let app = Application::from_loader(&loader)?;
//!     app.run(async { /* serve requests */ }).await?;
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use application::Application;
pub use domain::models::{
    BackendConfig, Config, CorsConfig, DatabaseConfig, GzipConfig, ProjectConfig,
    SecurityConfig, StaticFilesConfig, TemplatesConfig,
};
pub use domain::placeholder::{resolve, PlaceholderError, PlaceholderResolver};
pub use domain::ports::AuthScopeChecker;
pub use domain::{CoreError, CoreResult};
pub use infrastructure::config::{
    get_configuration, reset_configuration, ConfigError, ConfigLoader,
};
pub use infrastructure::database::{
    ConnectionError, ConnectionManager, ConnectionState, DatabaseError, Schema, Session,
    SessionProvider,
};
pub use infrastructure::logging::{LogConfig, LoggerImpl};
