use std::fmt;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::connection::Engine;
use super::errors::DatabaseError;
use super::schema::Schema;
use super::session::Session;
use crate::domain::models::DatabaseConfig;
use crate::domain::placeholder::PlaceholderResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Owns the process's database engine.
///
/// Starts `Disconnected`. `connect()` and `disconnect()` are driven by the
/// host's start and stop hooks; once connected, `get_session()` may be called
/// from any number of tasks at once.
#[derive(Debug)]
pub struct ConnectionManager {
    schema: Schema,
    engine: RwLock<Option<Engine>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(Schema::application())
    }
}

impl ConnectionManager {
    /// Manager that ensures `schema` on every connect
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            engine: RwLock::new(None),
        }
    }

    pub async fn state(&self) -> ConnectionState {
        if self.engine.read().await.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    /// Current engine, if connected
    pub async fn engine(&self) -> Option<Engine> {
        self.engine.read().await.clone()
    }

    /// Build the engine from `config`, resolving placeholders against the
    /// process environment.
    pub async fn connect(&self, config: &DatabaseConfig) -> Result<(), DatabaseError> {
        self.connect_with(config, &PlaceholderResolver::from_env()).await
    }

    /// Like [`ConnectionManager::connect`] with an explicit resolver.
    ///
    /// On failure nothing is kept and the manager stays `Disconnected`.
    pub async fn connect_with(
        &self,
        config: &DatabaseConfig,
        resolver: &PlaceholderResolver,
    ) -> Result<(), DatabaseError> {
        let mut slot = self.engine.write().await;
        if slot.is_some() {
            return Err(DatabaseError::AlreadyConnected);
        }

        // Log the template, never the resolved URL: it may carry secrets
        info!(url = %config.url, "Connecting to database");
        let engine = Engine::build(config, resolver, &self.schema)
            .await
            .map_err(|err| {
                error!(url = %config.url, error = %err, "Database connection failed");
                DatabaseError::Connection(err)
            })?;

        *slot = Some(engine);
        info!(
            pool_size = config.pool_size,
            max_overflow = config.max_overflow,
            "Database connection established"
        );
        Ok(())
    }

    /// Close the pool and return to `Disconnected`. No-op when not connected.
    pub async fn disconnect(&self) {
        let engine = self.engine.write().await.take();
        match engine {
            Some(engine) => {
                engine.dispose().await;
                info!("Database connection disposed");
            }
            None => debug!("disconnect requested while already disconnected"),
        }
    }

    /// Lease a session for one unit of work.
    ///
    /// The state lock is held only long enough to clone the engine handle, so
    /// callers contend on the pool alone.
    pub async fn get_session(&self) -> Result<Session, DatabaseError> {
        let engine = self
            .engine()
            .await
            .ok_or(DatabaseError::EngineNotInitialized)?;
        engine.session().await
    }
}
