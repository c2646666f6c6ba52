//! In-process snapshot store.
//!
//! Tables live in memory; a transaction works on a private copy of every table
//! it touches and swaps the copies in at commit. Every statement is recorded,
//! and failures can be injected, so the sync protocol can be exercised without
//! a database.

use super::{SnapshotStore, SnapshotTransaction, StoreError};
use crate::domain::{ClearMode, ColumnSpec, SqlValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A statement issued against the store, in the order it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Begin,
    Lock { table: String },
    Clear { table: String, mode: ClearMode },
    Insert { table: String, rows: usize },
    Commit,
    Rollback,
}

#[derive(Debug, Clone)]
struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

#[derive(Default)]
struct Faults {
    /// Fail the Nth insert (1-based) of each transaction.
    fail_insert_at: Option<usize>,
    exhausted: bool,
    insert_delay: Option<Duration>,
}

#[derive(Default)]
struct Inner {
    tables: Mutex<HashMap<String, MemoryTable>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    statements: Mutex<Vec<Statement>>,
    faults: Mutex<Faults>,
}

#[derive(Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<Inner>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) an empty table with the given columns.
    pub async fn create_table<S: AsRef<str>>(&self, name: &str, columns: &[S]) {
        let table = MemoryTable {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        };
        self.inner.tables.lock().await.insert(name.to_string(), table);
    }

    /// Committed rows of `table`, or `None` if it does not exist.
    pub async fn rows(&self, table: &str) -> Option<Vec<Vec<SqlValue>>> {
        self.inner
            .tables
            .lock()
            .await
            .get(table)
            .map(|t| t.rows.clone())
    }

    pub async fn row_count(&self, table: &str) -> usize {
        self.rows(table).await.map(|r| r.len()).unwrap_or(0)
    }

    pub async fn statements(&self) -> Vec<Statement> {
        self.inner.statements.lock().await.clone()
    }

    /// Row counts of every insert issued so far, in order.
    pub async fn insert_sizes(&self) -> Vec<usize> {
        self.statements()
            .await
            .into_iter()
            .filter_map(|s| match s {
                Statement::Insert { rows, .. } => Some(rows),
                _ => None,
            })
            .collect()
    }

    pub async fn clear_statements(&self) {
        self.inner.statements.lock().await.clear();
    }

    /// Makes the Nth insert of every later transaction fail (`None` disables).
    pub async fn fail_insert_at(&self, nth: Option<usize>) {
        self.inner.faults.lock().await.fail_insert_at = nth;
    }

    /// While set, `begin` fails as if the pool had no free connection.
    pub async fn set_exhausted(&self, exhausted: bool) {
        self.inner.faults.lock().await.exhausted = exhausted;
    }

    /// Sleeps before every insert, widening the window in which syncs overlap.
    pub async fn set_insert_delay(&self, delay: Option<Duration>) {
        self.inner.faults.lock().await.insert_delay = delay;
    }

    async fn record(&self, statement: Statement) {
        self.inner.statements.lock().await.push(statement);
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn begin(&self) -> Result<Box<dyn SnapshotTransaction>, StoreError> {
        let (fail_insert_at, insert_delay) = {
            let faults = self.inner.faults.lock().await;
            if faults.exhausted {
                return Err(StoreError::PoolTimedOut);
            }
            (faults.fail_insert_at, faults.insert_delay)
        };
        self.record(Statement::Begin).await;
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            staged: HashMap::new(),
            guards: Vec::new(),
            inserts: 0,
            fail_insert_at,
            insert_delay,
        }))
    }
}

struct MemoryTransaction {
    store: MemorySnapshotStore,
    staged: HashMap<String, MemoryTable>,
    guards: Vec<OwnedMutexGuard<()>>,
    inserts: usize,
    fail_insert_at: Option<usize>,
    insert_delay: Option<Duration>,
}

impl MemoryTransaction {
    async fn staged_table(&mut self, table: &str) -> Result<&mut MemoryTable, StoreError> {
        if !self.staged.contains_key(table) {
            let committed = self
                .store
                .inner
                .tables
                .lock()
                .await
                .get(table)
                .cloned()
                .ok_or_else(|| {
                    StoreError::Backend(format!("relation \"{}\" does not exist", table))
                })?;
            self.staged.insert(table.to_string(), committed);
        }
        self.staged
            .get_mut(table)
            .ok_or_else(|| StoreError::Backend(format!("relation \"{}\" does not exist", table)))
    }
}

#[async_trait]
impl SnapshotTransaction for MemoryTransaction {
    async fn lock_table(&mut self, table: &str) -> Result<(), StoreError> {
        let lock = {
            let mut locks = self.store.inner.locks.lock().await;
            locks.entry(table.to_string()).or_default().clone()
        };
        self.guards.push(lock.lock_owned().await);
        self.store
            .record(Statement::Lock {
                table: table.to_string(),
            })
            .await;
        Ok(())
    }

    async fn clear(&mut self, table: &str, mode: ClearMode) -> Result<u64, StoreError> {
        let staged = self.staged_table(table).await?;
        let removed = staged.rows.len() as u64;
        staged.rows.clear();
        self.store
            .record(Statement::Clear {
                table: table.to_string(),
                mode,
            })
            .await;
        Ok(removed)
    }

    async fn insert_rows(
        &mut self,
        table: &str,
        columns: &[ColumnSpec],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, StoreError> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        self.inserts += 1;
        if self.fail_insert_at == Some(self.inserts) {
            return Err(StoreError::Backend(format!(
                "injected failure on insert {} into \"{}\"",
                self.inserts, table
            )));
        }

        let staged = self.staged_table(table).await?;
        for c in columns {
            if !staged.columns.contains(&c.name) {
                return Err(StoreError::Backend(format!(
                    "column \"{}\" of relation \"{}\" does not exist",
                    c.name, table
                )));
            }
        }
        // Stored in the table's own column order, absent columns as NULL text.
        for row in rows {
            let stored = staged
                .columns
                .iter()
                .map(|name| {
                    columns
                        .iter()
                        .position(|c| &c.name == name)
                        .and_then(|i| row.get(i).cloned())
                        .unwrap_or(SqlValue::Text(None))
                })
                .collect();
            staged.rows.push(stored);
        }

        self.store
            .record(Statement::Insert {
                table: table.to_string(),
                rows: rows.len(),
            })
            .await;
        Ok(rows.len() as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        {
            let mut tables = this.store.inner.tables.lock().await;
            for (name, table) in this.staged {
                tables.insert(name, table);
            }
        }
        this.store.record(Statement::Commit).await;
        drop(this.guards);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.store.record(Statement::Rollback).await;
        Ok(())
    }
}
