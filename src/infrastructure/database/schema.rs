//! Schema objects created when an engine connects.
//!
//! Every statement must be idempotent (`CREATE ... IF NOT EXISTS`); they run
//! on each `connect()`. There is no versioning: this is create-if-absent, not
//! a migration system.

use sqlx::SqlitePool;
use tracing::debug;

use super::errors::ConnectionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObject {
    pub name: String,
    pub ddl: String,
}

/// Ordered set of schema objects
#[derive(Debug, Clone, Default)]
pub struct Schema {
    objects: Vec<SchemaObject>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables the service's own models live in
    pub fn application() -> Self {
        Self::new().with("users", include_str!("../../../schema/001_users.sql"))
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, ddl: impl Into<String>) -> Self {
        self.objects.push(SchemaObject {
            name: name.into(),
            ddl: ddl.into(),
        });
        self
    }

    pub fn objects(&self) -> &[SchemaObject] {
        &self.objects
    }

    pub async fn create_all(&self, pool: &SqlitePool) -> Result<(), ConnectionError> {
        for object in &self.objects {
            sqlx::query(&object.ddl)
                .execute(pool)
                .await
                .map_err(|source| ConnectionError::SchemaCreationFailed {
                    name: object.name.clone(),
                    source,
                })?;
            debug!(object = %object.name, "schema object ensured");
        }
        Ok(())
    }
}
