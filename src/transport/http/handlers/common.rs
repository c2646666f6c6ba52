use crate::app::SyncError;
use crate::transport::http::types::SyncResponse;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::any::Any;
use std::net::SocketAddr;

impl SyncError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncError::Authentication => StatusCode::UNAUTHORIZED,
            SyncError::Validation(_) => StatusCode::BAD_REQUEST,
            SyncError::PoolExhausted(_) | SyncError::Transaction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(SyncResponse::failure(self.to_string()))).into_response()
    }
}

/// Best-effort network origin of the caller: the first `X-Forwarded-For` hop,
/// else the socket peer address.
pub fn caller_origin(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|hop| hop.trim().to_string())
        .filter(|hop| !hop.is_empty())
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Converts a handler panic into a generic 500 so the server keeps serving.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SyncResponse::failure("Internal server error")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn status_mapping() {
        assert_eq!(SyncError::Authentication.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            SyncError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SyncError::PoolExhausted("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            SyncError::Transaction("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn origin_prefers_forwarded_header() {
        let peer: SocketAddr = "10.0.0.9:51000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(caller_origin(&headers, Some(peer)), "10.0.0.9");
        assert_eq!(caller_origin(&headers, None), "unknown");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(caller_origin(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn panic_becomes_500() {
        let resp = handle_panic(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
