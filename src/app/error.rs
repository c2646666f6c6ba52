use crate::storage::snapshot::StoreError;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

/// Why a sync request did not commit.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or wrong shared secret.
    #[error("Invalid API key")]
    Authentication,

    /// The payload is not shaped like a snapshot.
    #[error("Invalid data format")]
    Validation(String),

    /// No connection could be checked out in time.
    #[error("{0}")]
    PoolExhausted(String),

    /// Clearing, inserting or committing failed; the transaction was rolled back.
    #[error("{0}")]
    Transaction(String),
}

impl SyncError {
    /// Maps a failure to open a transaction.
    pub fn from_begin(e: StoreError) -> Self {
        match e {
            StoreError::PoolTimedOut => SyncError::PoolExhausted(e.to_string()),
            other => SyncError::Transaction(other.to_string()),
        }
    }
}
