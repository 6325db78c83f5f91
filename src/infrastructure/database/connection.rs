//! SQLite engine construction.

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::debug;

use super::errors::{ConnectionError, DatabaseError};
use super::schema::Schema;
use super::session::Session;
use super::url::DatabaseUrl;
use crate::domain::models::DatabaseConfig;
use crate::domain::placeholder::PlaceholderResolver;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Log statements through sqlx
    pub echo: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from(&DatabaseConfig::new("sqlite://"))
    }
}

impl From<&DatabaseConfig> for PoolConfig {
    /// `pool_size + max_overflow` connections at most
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections(),
            acquire_timeout: config.pool_timeout(),
            echo: config.echo,
        }
    }
}

pub async fn create_pool(url: &DatabaseUrl, config: &PoolConfig) -> Result<SqlitePool, ConnectionError> {
    pool_options(url, config)
        .connect_with(connect_options(url, config)?)
        .await
        .map_err(ConnectionError::PoolCreationFailed)
}

fn connect_options(url: &DatabaseUrl, config: &PoolConfig) -> Result<SqliteConnectOptions, ConnectionError> {
    let options = url.connect_options()?;
    Ok(if config.echo {
        options
    } else {
        options.disable_statement_logging()
    })
}

fn pool_options(url: &DatabaseUrl, config: &PoolConfig) -> SqlitePoolOptions {
    let options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout);

    // A shared in-memory database disappears with its last connection, so
    // one connection is opened up front and never reaped.
    if url.is_memory() {
        options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options.min_connections(0)
    }
}

pub async fn verify_connection(pool: &SqlitePool) -> Result<(), ConnectionError> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(ConnectionError::ConnectionFailed)?;
    Ok(())
}

/// Pooled connection handle backing all database access.
///
/// Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct Engine {
    url: String,
    pool: SqlitePool,
    pool_config: PoolConfig,
}

impl Engine {
    /// Resolve the URL, open the pool, validate it and ensure `schema`.
    ///
    /// The pool is closed again if anything after its creation fails.
    pub async fn build(
        config: &DatabaseConfig,
        resolver: &PlaceholderResolver,
        schema: &Schema,
    ) -> Result<Self, ConnectionError> {
        let url = resolver.resolve(&config.url)?;
        let target = DatabaseUrl::parse(&url)?;
        let pool_config = PoolConfig::from(config);

        let pool = create_pool(&target, &pool_config).await?;
        if let Err(err) = prepare(&pool, schema).await {
            pool.close().await;
            return Err(err);
        }

        debug!(
            max_connections = pool_config.max_connections,
            acquire_timeout_secs = pool_config.acquire_timeout.as_secs(),
            "engine pool ready"
        );
        Ok(Self {
            url,
            pool,
            pool_config,
        })
    }

    /// Resolved URL the engine is bound to
    pub fn url(&self) -> &str {
        &self.url
    }

    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub const fn pool_config(&self) -> &PoolConfig {
        &self.pool_config
    }

    /// Lease one connection, waiting at most the pool timeout
    pub async fn session(&self) -> Result<Session, DatabaseError> {
        let connection = self.pool.acquire().await.map_err(DatabaseError::Acquire)?;
        Ok(Session::new(connection))
    }

    /// Close every pooled connection; outstanding sessions finish first
    pub async fn dispose(&self) {
        self.pool.close().await;
    }

    pub fn is_disposed(&self) -> bool {
        self.pool.is_closed()
    }
}

async fn prepare(pool: &SqlitePool, schema: &Schema) -> Result<(), ConnectionError> {
    verify_connection(pool).await?;
    schema.create_all(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_from_database_config() {
        let database = DatabaseConfig {
            pool_size: 3,
            max_overflow: 2,
            pool_timeout_secs: 7,
            ..DatabaseConfig::new("sqlite://")
        };

        let pool_config = PoolConfig::from(&database);
        assert_eq!(pool_config.max_connections, 5);
        assert_eq!(pool_config.acquire_timeout, Duration::from_secs(7));
        assert!(!pool_config.echo);
    }

    #[test]
    fn test_memory_pool_keeps_its_connection() {
        let options = pool_options(&DatabaseUrl::Memory, &PoolConfig::default());

        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);
    }

    #[test]
    fn test_file_pool_reaps_idle_connections() {
        let url = DatabaseUrl::File("app.db".into());
        let pool_config = PoolConfig {
            max_connections: 3,
            ..PoolConfig::default()
        };
        let options = pool_options(&url, &pool_config);

        assert_eq!(options.get_min_connections(), 0);
        assert_eq!(options.get_max_connections(), 3);
        assert!(options.get_idle_timeout().is_some());
        assert!(options.get_max_lifetime().is_some());
    }

    #[test]
    fn test_echo_controls_statement_logging() {
        let quiet = PoolConfig {
            echo: false,
            ..PoolConfig::default()
        };
        let loud = PoolConfig {
            echo: true,
            ..PoolConfig::default()
        };

        let quiet = format!("{:?}", connect_options(&DatabaseUrl::Memory, &quiet).unwrap());
        let loud = format!("{:?}", connect_options(&DatabaseUrl::Memory, &loud).unwrap());

        assert!(quiet.contains("statements_level: Off"), "{quiet}");
        assert!(!loud.contains("statements_level: Off"), "{loud}");
    }

    #[tokio::test]
    async fn test_memory_engine() {
        let resolver = PlaceholderResolver::default();
        let engine = Engine::build(&DatabaseConfig::new("sqlite://"), &resolver, &Schema::application())
            .await
            .expect("failed to build engine");

        assert_eq!(engine.url(), "sqlite://");
        assert!(!engine.is_disposed());

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'")
                .fetch_one(engine.pool())
                .await
                .expect("failed to query sqlite_master");
        assert_eq!(count, 1, "users table should exist");

        engine.dispose().await;
        assert!(engine.is_disposed());
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let engine = Engine::build(
            &DatabaseConfig::new("sqlite::memory:"),
            &PlaceholderResolver::default(),
            &Schema::new(),
        )
        .await
        .expect("failed to build engine");

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(engine.pool())
            .await
            .expect("failed to check foreign keys pragma");
        assert_eq!(result.0, 1, "foreign keys should be enabled");

        engine.dispose().await;
    }

    #[tokio::test]
    async fn test_broken_schema_closes_pool() {
        let schema = Schema::new().with("broken", "CREATE TABLE");
        let result = Engine::build(
            &DatabaseConfig::new("sqlite://"),
            &PlaceholderResolver::default(),
            &schema,
        )
        .await;

        assert!(matches!(
            result,
            Err(ConnectionError::SchemaCreationFailed { ref name, .. }) if name == "broken"
        ));
    }

    #[tokio::test]
    async fn test_unresolved_url() {
        let result = Engine::build(
            &DatabaseConfig::new("sqlite:///{{ENGINE_TEST_UNSET}}"),
            &PlaceholderResolver::default(),
            &Schema::new(),
        )
        .await;

        assert!(matches!(result, Err(ConnectionError::UnresolvedUrl(_))));
    }
}
