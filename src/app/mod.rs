pub mod auth;
pub mod batch_inserter;
pub mod error;
pub mod sync_service;

pub use auth::{AuthDecision, AuthGate};
pub use error::{SyncError, SyncResult};
pub use sync_service::{SyncPhase, SyncService, SyncSettings};
