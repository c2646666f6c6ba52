pub mod payload;
pub mod router;
pub mod types;
pub mod handlers {
    pub mod common;
    pub mod health;
    pub mod sync;
}

pub use handlers::common::handle_panic;
pub use router::{create_router, ApiDoc};
pub use types::{AppState, HealthResponse, SyncRequestBody, SyncResponse};
