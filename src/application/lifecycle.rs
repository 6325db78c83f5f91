//! Process lifecycle: owns the configuration and the connection manager and
//! drives them through startup and shutdown in a fixed order.

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::{CoreError, CoreResult};
use crate::domain::models::{Config, SecurityConfig};
use crate::domain::placeholder::PlaceholderResolver;
use crate::domain::ports::AuthScopeChecker;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::database::{ConnectionManager, Schema, SessionProvider};
use crate::infrastructure::logging::LoggerImpl;

/// The running service's shared state.
///
/// Build one per process; hand [`Application::sessions`] and
/// [`Application::config`] to request handlers.
#[derive(Debug)]
pub struct Application {
    config: Arc<Config>,
    database: Arc<ConnectionManager>,
}

impl Application {
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_schema(config, Schema::application())
    }

    pub fn with_schema(config: Arc<Config>, schema: Schema) -> Self {
        Self {
            config,
            database: Arc::new(ConnectionManager::new(schema)),
        }
    }

    /// Application over the loader's cached configuration
    pub fn from_loader(loader: &ConfigLoader) -> CoreResult<Self> {
        Ok(Self::new(loader.get_configuration()?))
    }

    /// Install logging from the file named by `LOGGING`.
    ///
    /// Keep the returned logger alive until exit.
    pub fn setup_logging(loader: &ConfigLoader) -> CoreResult<LoggerImpl> {
        let log_config = loader.load_logging_config()?;
        LoggerImpl::init(&log_config).map_err(CoreError::Logging)
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Read-only token parameters for the auth collaborator
    pub fn security(&self) -> &SecurityConfig {
        &self.config.security
    }

    /// Signing secret with placeholders resolved against the environment
    pub fn secret_key(&self) -> CoreResult<Option<String>> {
        Ok(self.security().resolved_secret_key()?)
    }

    pub const fn database(&self) -> &Arc<ConnectionManager> {
        &self.database
    }

    pub fn sessions(&self) -> SessionProvider {
        SessionProvider::new(Arc::clone(&self.database))
    }

    /// Start hook: connect the database. Failure must abort startup.
    pub async fn startup(&self) -> CoreResult<()> {
        self.startup_with(&PlaceholderResolver::from_env()).await
    }

    pub async fn startup_with(&self, resolver: &PlaceholderResolver) -> CoreResult<()> {
        self.database
            .connect_with(&self.config.database, resolver)
            .await?;
        info!(
            title = %self.config.project.title,
            version = %self.config.project.version,
            bind = %self.config.backend.bind_address(),
            "Application startup complete."
        );
        Ok(())
    }

    /// Stop hook: release every pooled connection
    pub async fn shutdown(&self) {
        self.database.disconnect().await;
        info!("Application shutdown complete.");
    }

    /// Run `serve` between startup and shutdown.
    ///
    /// `serve` is never polled if startup fails.
    pub async fn run<F, T>(&self, serve: F) -> CoreResult<T>
    where
        F: Future<Output = T>,
    {
        self.startup().await?;
        let output = serve.await;
        self.shutdown().await;
        Ok(output)
    }

    /// Delegate a token check to `checker` with this service's security settings
    pub fn authorize<C: AuthScopeChecker>(
        &self,
        checker: &C,
        token: &str,
        required_scopes: &[&str],
    ) -> Result<Option<C::Identity>, C::Error> {
        checker.check(self.security(), token, required_scopes)
    }
}
