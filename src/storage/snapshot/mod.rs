//! Transactional table stores that a snapshot sync writes through.
//!
//! The sync service only sees the two traits below, so the PostgreSQL store
//! used in production and the in-process store used by tests are interchangeable.

pub mod memory;
pub mod postgres;

pub use memory::{MemorySnapshotStore, Statement};
pub use postgres::{build_insert, PgSnapshotStore};

use crate::domain::{ClearMode, ColumnSpec, SqlValue};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No pooled connection became available within the acquire timeout.
    #[error("timed out waiting for a database connection")]
    PoolTimedOut,
    #[error(transparent)]
    Database(sqlx::Error),
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => StoreError::PoolTimedOut,
            other => StoreError::Database(other),
        }
    }
}

/// Hands out transactions, each holding one connection until it ends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn SnapshotTransaction>, StoreError>;
}

/// One open transaction against the store.
///
/// Dropping a transaction without calling `commit` discards its writes.
#[async_trait]
pub trait SnapshotTransaction: Send {
    /// Blocks until no other transaction holds the lock for `table`; released at commit/rollback.
    async fn lock_table(&mut self, table: &str) -> Result<(), StoreError>;

    /// Removes every row of `table`, returning how many were removed when the store reports it.
    async fn clear(&mut self, table: &str, mode: ClearMode) -> Result<u64, StoreError>;

    /// Inserts `rows` (values in `columns` order) with a single statement.
    async fn insert_rows(
        &mut self,
        table: &str,
        columns: &[ColumnSpec],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
