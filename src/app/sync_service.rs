//! The snapshot sync service.
//!
//! Replaces the full contents of a table with an uploaded snapshot inside one
//! transaction:
//! 1.  Coerce every record against the table schema (no connection held yet).
//! 2.  Open a transaction and, when enabled, take the per-table lock.
//! 3.  Clear the table (delete or truncate, per the clear policy).
//! 4.  Insert the rows chunk by chunk.
//! 5.  Commit; on any failure roll back so the table is left as it was.

use crate::app::batch_inserter::insert_in_chunks;
use crate::app::error::{SyncError, SyncResult};
use crate::domain::{
    coerce_record, resolve_table_name, ClearMode, ClearPolicy, SqlValue, SyncOutcome,
    SyncRequest, TableSchema,
};
use crate::storage::snapshot::{SnapshotStore, SnapshotTransaction, StoreError};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Where a sync transaction is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    TransactionOpen,
    Clearing,
    Inserting,
    Committed,
    RolledBack,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::TransactionOpen => "transaction_open",
            SyncPhase::Clearing => "clearing",
            SyncPhase::Inserting => "inserting",
            SyncPhase::Committed => "committed",
            SyncPhase::RolledBack => "rolled_back",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub default_table: String,
    pub clear_policy: ClearPolicy,
    /// Serialize concurrent syncs of the same table.
    pub lock_table: bool,
}

pub struct SyncService {
    store: Arc<dyn SnapshotStore>,
    schema: Arc<TableSchema>,
    settings: SyncSettings,
}

impl SyncService {
    pub fn new(store: Arc<dyn SnapshotStore>, schema: TableSchema, settings: SyncSettings) -> Self {
        Self {
            store,
            schema: Arc::new(schema),
            settings,
        }
    }

    /// Runs one snapshot sync. Exactly one attempt; the caller retries by resubmitting.
    pub async fn sync(&self, request: SyncRequest) -> SyncResult<SyncOutcome> {
        let started = Instant::now();
        let table =
            resolve_table_name(request.table_name.as_deref(), &self.settings.default_table)
                .to_string();
        let mode = self.settings.clear_policy.resolve(request.truncate_first);

        let rows: Vec<Vec<SqlValue>> = request
            .records
            .iter()
            .map(|r| coerce_record(r, &self.schema))
            .collect();

        let mut phase = SyncPhase::Idle;
        debug!(%table, %phase, records = rows.len(), "sync requested");

        let mut tx = match self.store.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                error!(%table, %phase, error = %e, "could not open sync transaction");
                return Err(SyncError::from_begin(e));
            }
        };
        phase = SyncPhase::TransactionOpen;
        debug!(%table, %phase, "transaction open");

        match self.apply(tx.as_mut(), &table, mode, &rows, &mut phase).await {
            Ok((inserted_count, chunks)) => {
                if let Err(e) = tx.commit().await {
                    error!(%table, %phase, error = %e, "commit failed");
                    return Err(SyncError::Transaction(e.to_string()));
                }
                phase = SyncPhase::Committed;
                info!(
                    %table,
                    %phase,
                    clear_mode = %mode,
                    inserted = inserted_count,
                    chunks,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "snapshot sync committed"
                );
                Ok(SyncOutcome {
                    table,
                    clear_mode: mode,
                    inserted_count,
                    chunks,
                })
            }
            Err(e) => {
                let failed_in = phase;
                if let Err(rb) = tx.rollback().await {
                    warn!(%table, error = %rb, "rollback failed; connection will be discarded");
                }
                phase = SyncPhase::RolledBack;
                error!(%table, %phase, %failed_in, error = %e, "snapshot sync rolled back");
                Err(SyncError::Transaction(e.to_string()))
            }
        }
    }

    async fn apply(
        &self,
        tx: &mut dyn SnapshotTransaction,
        table: &str,
        mode: ClearMode,
        rows: &[Vec<SqlValue>],
        phase: &mut SyncPhase,
    ) -> Result<(u64, usize), StoreError> {
        if self.settings.lock_table {
            tx.lock_table(table).await?;
        }

        *phase = SyncPhase::Clearing;
        let removed = tx.clear(table, mode).await?;
        debug!(%table, phase = %*phase, clear_mode = %mode, removed, "table cleared");

        *phase = SyncPhase::Inserting;
        let progress = insert_in_chunks(tx, table, &self.schema, rows).await?;
        Ok((progress.inserted, progress.chunks))
    }
}
