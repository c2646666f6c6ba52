use crate::app::{AuthDecision, SyncError};
use crate::transport::http::handlers::common::caller_origin;
use crate::transport::http::payload::{credential, decode_body, parse_sync_payload};
use crate::transport::http::types::{AppState, SyncResponse};
use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::net::SocketAddr;

#[utoipa::path(
    post,
    path = "/api/sync",
    request_body = crate::transport::http::types::SyncRequestBody,
    responses(
        (status = 200, description = "Table replaced with the snapshot", body = SyncResponse),
        (status = 400, description = "`data` is not an array", body = SyncResponse),
        (status = 401, description = "Invalid API key", body = SyncResponse),
        (status = 500, description = "Sync failed and was rolled back", body = SyncResponse)
    )
)]
pub async fn sync_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = decode_body(&body);

    // Credential first: nothing else about the request is inspected until it passes.
    if state.auth.check(credential(&body)) == AuthDecision::Unauthorized {
        let origin = caller_origin(&headers, peer.map(|ConnectInfo(addr)| addr));
        tracing::warn!(%origin, "sync rejected: invalid API key");
        return SyncError::Authentication.into_response();
    }

    let request = match parse_sync_payload(&body) {
        Ok(r) => r,
        Err(e) => {
            if let SyncError::Validation(reason) = &e {
                tracing::warn!(%reason, "sync rejected: invalid data format");
            }
            return e.into_response();
        }
    };

    match state.sync_service.sync(request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(SyncResponse::inserted(outcome.inserted_count)),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
