use crate::transport::http::handlers::common::handle_panic;
use crate::transport::http::handlers::{health, sync};
use crate::transport::http::types::{AppState, HealthResponse, SyncRequestBody, SyncResponse};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(health::healthcheck_handler, sync::sync_handler),
    components(schemas(SyncRequestBody, SyncResponse, HealthResponse))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    let body_limit = app_state.max_body_bytes;
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/sync", post(sync::sync_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(app_state)
}
