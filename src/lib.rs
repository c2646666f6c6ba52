pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{AuthGate, SyncError, SyncService, SyncSettings};
pub use domain::{ClearPolicy, SyncOutcome, SyncRequest, TableSchema};
pub use infra::Config;
pub use storage::snapshot::{MemorySnapshotStore, PgSnapshotStore, SnapshotStore};
