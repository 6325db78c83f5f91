//! Database URL translation.
//!
//! Configuration files use the `sqlite:///relative.db` /
//! `sqlite:////absolute.db` convention; sqlx wants a file name. Both the
//! triple-slash form and sqlx's own `sqlite:path` form are accepted.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};

use super::errors::ConnectionError;

const MEMORY_URL: &str = "sqlite::memory:";

/// Where a SQLite engine keeps its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    Memory,
    File(PathBuf),
}

impl DatabaseUrl {
    pub fn parse(url: &str) -> Result<Self, ConnectionError> {
        let invalid = || ConnectionError::InvalidDatabaseUrl(url.to_string());

        let (scheme, rest) = url.split_once(':').ok_or_else(invalid)?;
        // `sqlite+driver://` names a driver we have no use for
        let dialect = scheme.split('+').next().unwrap_or(scheme);
        if !dialect.eq_ignore_ascii_case("sqlite") {
            return Err(ConnectionError::UnsupportedScheme(scheme.to_string()));
        }

        let path = match rest.strip_prefix("//") {
            Some("") => "",
            // The authority part must be empty: `sqlite:///<path>`
            Some(after_authority) => after_authority.strip_prefix('/').ok_or_else(invalid)?,
            None => rest,
        };
        let path = path.split_once('?').map_or(path, |(path, _query)| path);

        if path.is_empty() || path == ":memory:" {
            Ok(Self::Memory)
        } else {
            Ok(Self::File(PathBuf::from(path)))
        }
    }

    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    /// sqlx connect options with the pragmas every engine uses
    pub fn connect_options(&self) -> Result<SqliteConnectOptions, ConnectionError> {
        let options = match self {
            Self::Memory => SqliteConnectOptions::from_str(MEMORY_URL)
                .map_err(|_| ConnectionError::InvalidDatabaseUrl(MEMORY_URL.to_string()))?
                .shared_cache(true),
            Self::File(path) => {
                ensure_database_directory(path)?;
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
            }
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5)))
    }
}

fn ensure_database_directory(path: &Path) -> Result<(), ConnectionError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(ConnectionError::DirectoryCreationFailed)?;
        }
    }
    Ok(())
}
