use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use backend_core::{ConnectionManager, DatabaseConfig, PlaceholderResolver, Schema};
use tempfile::TempDir;

/// `sqlite:///` URL for a database file inside `dir`
pub fn sqlite_url(dir: &TempDir, file_name: &str) -> String {
    format!("sqlite:///{}", dir.path().join(file_name).display())
}

/// File-backed database config with a fixed pool and a short wait
pub fn file_database_config(dir: &TempDir, pool_size: u32, max_overflow: u32) -> DatabaseConfig {
    DatabaseConfig {
        pool_size,
        max_overflow,
        pool_timeout_secs: 1,
        ..DatabaseConfig::new(sqlite_url(dir, "test.db"))
    }
}

/// Connected manager over a fresh database file in `dir`
///
/// # Example
/// ```ignore
/// let dir = TempDir::new().unwrap();
/// let manager = setup_test_manager(&dir, 2, 0).await;
/// // Use manager for testing...
/// teardown_test_manager(&manager).await;
/// ```
pub async fn setup_test_manager(
    dir: &TempDir,
    pool_size: u32,
    max_overflow: u32,
) -> Arc<ConnectionManager> {
    let manager = Arc::new(ConnectionManager::new(Schema::application()));
    manager
        .connect_with(
            &file_database_config(dir, pool_size, max_overflow),
            &PlaceholderResolver::default(),
        )
        .await
        .expect("failed to connect test database");
    manager
}

/// Dispose the pool; always call this at the end of a test
pub async fn teardown_test_manager(manager: &ConnectionManager) {
    manager.disconnect().await;
}

/// Minimal valid configuration document pointing at `database_url`
pub fn config_json(database_url: &str) -> String {
    serde_json::json!({
        "project": {
            "title": "Test Service",
            "description": "Service under test",
            "author": "QA"
        },
        "database": { "url": database_url }
    })
    .to_string()
}

/// Write `content` to `dir/name` and return the absolute path
pub fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("failed to write config file");
    path
}
