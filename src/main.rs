//! Snapshot sync API server.

use anyhow::Context;
use axum::http::HeaderValue;
use snapshot_sync::infra::{logging, Config};
use snapshot_sync::transport::http::{create_router, ApiDoc, AppState};
use snapshot_sync::{AuthGate, PgSnapshotStore, SyncService, SyncSettings};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    logging::init(config.log_format);
    tracing::info!(?config, "starting snapshot sync server");

    // --- Database pool ---
    let store = PgSnapshotStore::connect(&config.database)
        .await
        .context("failed to connect to PostgreSQL")?;
    let pool = store.pool().clone();

    // --- Service ---
    let sync_service = SyncService::new(
        Arc::new(store),
        config.schema.clone(),
        SyncSettings {
            default_table: config.default_table.clone(),
            clear_policy: config.clear_policy,
            lock_table: config.lock_table,
        },
    );
    let app_state = AppState {
        sync_service: Arc::new(sync_service),
        auth: Arc::new(AuthGate::new(config.api_key.clone())),
        max_body_bytes: config.max_body_bytes,
    };

    // --- HTTP ---
    let allow_origin = match &config.cors_allow_origin {
        Some(origin) => AllowOrigin::exact(
            HeaderValue::from_str(origin).context("CORS_ALLOW_ORIGIN is not a valid header value")?,
        ),
        None => AllowOrigin::from(Any),
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "listening; swagger UI at /swagger-ui");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received; draining in-flight requests");
}
