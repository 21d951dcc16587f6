use std::{future::Future, pin::Pin};

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, IsolationLevel,
    TransactionTrait,
};

use crate::ResultEngine;
use crate::error::EngineError;

mod accounts;
mod admin;
mod transfers;
mod wagers;

pub use accounts::LedgerPage;
pub use admin::AdminAdjustCmd;
pub use transfers::{TransferCmd, TransferOutcome};
pub use wagers::{ProposeWagerCmd, WagerSettlement};

/// Attempt cap for [`Engine::with_retry`].
const MAX_TX_ATTEMPTS: u32 = 5;

/// Returns true for store-level conflicts that are safe to retry: a
/// serialization failure or deadlock abort, never a business-rule violation.
fn is_conflict(err: &DbErr) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("40001")
        || msg.contains("40p01")
        || msg.contains("serialization failure")
        || msg.contains("deadlock")
        || msg.contains("database is locked")
}

type TxFuture<'c, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 'c>>;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    async fn begin_serializable(&self) -> Result<DatabaseTransaction, DbErr> {
        // SQLite transactions are serializable already and reject explicit
        // isolation configuration; other backends get the strictest level.
        match self.database.get_database_backend() {
            DbBackend::Sqlite => self.database.begin().await,
            _ => {
                self.database
                    .begin_with_config(Some(IsolationLevel::Serializable), None)
                    .await
            }
        }
    }

    /// Runs `work` inside one serializable transaction, committing on success.
    ///
    /// On a conflict-class store error the whole attempt is discarded and
    /// `work` re-runs from scratch, up to [`MAX_TX_ATTEMPTS`] times; after
    /// exhaustion the caller gets [`EngineError::Conflict`]. Domain errors
    /// abort the transaction immediately and are returned untouched, so
    /// business logic stays retry-agnostic.
    pub(crate) async fn with_retry<F, T>(&self, mut work: F) -> ResultEngine<T>
    where
        F: for<'c> FnMut(&'c Engine, &'c DatabaseTransaction) -> TxFuture<'c, T>,
    {
        let mut attempt: u32 = 1;
        loop {
            let db_tx = self.begin_serializable().await?;
            match work(self, &db_tx).await {
                Ok(value) => match db_tx.commit().await {
                    Ok(()) => return Ok(value),
                    Err(err) if is_conflict(&err) => {}
                    Err(err) => return Err(err.into()),
                },
                Err(EngineError::Database(err)) if is_conflict(&err) => {
                    let _ = db_tx.rollback().await;
                }
                Err(err) => {
                    let _ = db_tx.rollback().await;
                    return Err(err);
                }
            }

            if attempt >= MAX_TX_ATTEMPTS {
                return Err(EngineError::Conflict(attempt));
            }
            attempt += 1;
            tracing::debug!(attempt, "retrying conflicted transaction");
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_failures_are_conflicts() {
        let err = DbErr::Custom("SQLSTATE 40001: serialization failure".to_string());
        assert!(is_conflict(&err));
    }

    #[test]
    fn deadlocks_are_conflicts() {
        let err = DbErr::Custom("deadlock detected (40P01)".to_string());
        assert!(is_conflict(&err));
    }

    #[test]
    fn locked_sqlite_database_is_a_conflict() {
        let err = DbErr::Custom("database is locked".to_string());
        assert!(is_conflict(&err));
    }

    #[test]
    fn constraint_violations_are_not_conflicts() {
        let err = DbErr::Custom("UNIQUE constraint failed: accounts.user_id".to_string());
        assert!(!is_conflict(&err));
    }
}
