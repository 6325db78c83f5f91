//! Top-level error for service startup and request handling.

use thiserror::Error;

use crate::domain::placeholder::PlaceholderError;
use crate::infrastructure::config::ConfigError;
use crate::infrastructure::database::DatabaseError;

/// Errors surfaced by the application lifecycle.
///
/// Configuration and connection failures at startup are fatal; request-scope
/// failures are handed to the caller's own error translation unchanged.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Logging setup failed: {0}")]
    Logging(#[source] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// True for the failures that must abort process startup.
    pub const fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Database(DatabaseError::Connection(_)) | Self::Logging(_)
        )
    }
}
