//! Infrastructure layer module
//!
//! Adapters with side effects:
//! - Configuration file loading (figment)
//! - Database engine and sessions (SQLite with sqlx)
//! - Logging setup (tracing)

pub mod config;
pub mod database;
pub mod logging;
