use thiserror::Error;

use crate::domain::placeholder::PlaceholderError;

/// Failures while building an engine in `connect()`
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to resolve database URL: {0}")]
    UnresolvedUrl(#[from] PlaceholderError),

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Unsupported database scheme '{0}', only sqlite is available")]
    UnsupportedScheme(String),

    #[error("Failed to create directory: {0}")]
    DirectoryCreationFailed(#[source] std::io::Error),

    #[error("Failed to create pool: {0}")]
    PoolCreationFailed(#[source] sqlx::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    #[error("Failed to create schema object '{name}': {source}")]
    SchemaCreationFailed {
        name: String,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database engine is not initialized")]
    EngineNotInitialized,

    #[error("Database is already connected")]
    AlreadyConnected,

    #[error("Database connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// No pooled connection became free within the pool timeout, or the
    /// pool was closed while waiting
    #[error("Failed to acquire a session: {0}")]
    Acquire(#[source] sqlx::Error),

    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),
}
