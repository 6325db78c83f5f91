//! Database engine lifecycle and session leasing (SQLite through sqlx).

pub mod connection;
pub mod errors;
pub mod manager;
pub mod schema;
pub mod session;
pub mod url;

pub use connection::{create_pool, verify_connection, Engine, PoolConfig};
pub use errors::{ConnectionError, DatabaseError};
pub use manager::{ConnectionManager, ConnectionState};
pub use schema::{Schema, SchemaObject};
pub use session::{Session, SessionProvider};
pub use url::DatabaseUrl;
