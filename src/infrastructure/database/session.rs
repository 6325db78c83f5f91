use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use futures::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::{debug, warn};

use super::errors::DatabaseError;
use super::manager::ConnectionManager;

/// One leased pooled connection.
///
/// Returned to the pool when dropped, whichever way the owning scope exits.
/// Derefs to [`SqliteConnection`], so `&mut *session` is an sqlx executor.
pub struct Session {
    connection: PoolConnection<Sqlite>,
}

impl Session {
    pub(crate) fn new(connection: PoolConnection<Sqlite>) -> Self {
        debug!("Database session created");
        Self { connection }
    }

    /// Start a transaction; it rolls back if dropped without `commit()`
    pub async fn begin(&mut self) -> Result<Transaction<'_, Sqlite>, DatabaseError> {
        Ok(sqlx::Connection::begin(&mut *self.connection).await?)
    }
}

impl Deref for Session {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        &self.connection
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        &mut self.connection
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("Database session closed");
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// Request-scoped access to the shared [`ConnectionManager`].
///
/// Cheap to clone; hand one to every request handler.
#[derive(Debug, Clone)]
pub struct SessionProvider {
    manager: Arc<ConnectionManager>,
}

impl SessionProvider {
    pub const fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub async fn lease(&self) -> Result<Session, DatabaseError> {
        self.manager.get_session().await
    }

    /// Run `work` as one transaction on a freshly leased session.
    ///
    /// Commits when `work` returns `Ok`, rolls back and hands back the
    /// caller's error untouched when it returns `Err`.
    pub async fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, E>>,
        E: From<DatabaseError>,
    {
        let mut session = self.lease().await?;
        let mut tx = session.begin().await?;

        let outcome = work(&mut *tx).await;
        match outcome {
            Ok(value) => {
                tx.commit().await.map_err(DatabaseError::Query)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::DatabaseConfig;
    use crate::domain::placeholder::PlaceholderResolver;
    use crate::infrastructure::database::Schema;
    use futures::FutureExt;

    async fn connected_provider() -> SessionProvider {
        let manager = Arc::new(ConnectionManager::new(
            Schema::new().with("items", "CREATE TABLE IF NOT EXISTS items (name TEXT NOT NULL)"),
        ));
        manager
            .connect_with(&DatabaseConfig::new("sqlite://"), &PlaceholderResolver::default())
            .await
            .expect("failed to connect");
        SessionProvider::new(manager)
    }

    async fn count_items(provider: &SessionProvider) -> i64 {
        let mut session = provider.lease().await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
            .fetch_one(&mut *session)
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_lease_executes_queries() {
        let provider = connected_provider().await;

        let mut session = provider.lease().await.expect("failed to lease session");
        let (one,): (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&mut *session)
            .await
            .expect("query failed");
        assert_eq!(one, 1);
        drop(session);

        provider.manager().disconnect().await;
    }

    #[tokio::test]
    async fn test_transaction_commits() {
        let provider = connected_provider().await;

        let inserted: Result<u64, DatabaseError> = provider
            .transaction(|conn| {
                async move {
                    let result = sqlx::query("INSERT INTO items (name) VALUES ('a'), ('b')")
                        .execute(&mut *conn)
                        .await?;
                    Ok::<_, DatabaseError>(result.rows_affected())
                }
                .boxed()
            })
            .await;

        assert_eq!(inserted.unwrap(), 2);
        assert_eq!(count_items(&provider).await, 2);

        provider.manager().disconnect().await;
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_error() {
        let provider = connected_provider().await;

        let result: Result<(), DatabaseError> = provider
            .transaction(|conn| {
                async move {
                    sqlx::query("INSERT INTO items (name) VALUES ('a')")
                        .execute(&mut *conn)
                        .await?;
                    // NOT NULL violation aborts the unit of work
                    sqlx::query("INSERT INTO items (name) VALUES (NULL)")
                        .execute(&mut *conn)
                        .await?;
                    Ok::<_, DatabaseError>(())
                }
                .boxed()
            })
            .await;

        assert!(matches!(result, Err(DatabaseError::Query(_))));
        assert_eq!(count_items(&provider).await, 0);

        provider.manager().disconnect().await;
    }

    #[tokio::test]
    async fn test_transaction_requires_connection() {
        let provider = SessionProvider::new(Arc::new(ConnectionManager::default()));

        let result: Result<(), DatabaseError> = provider
            .transaction(|_conn| async { Ok(()) }.boxed())
            .await;

        assert!(matches!(result, Err(DatabaseError::EngineNotInitialized)));
    }
}
