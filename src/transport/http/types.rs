use crate::app::{AuthGate, SyncService};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub sync_service: Arc<SyncService>,
    pub auth: Arc<AuthGate>,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

/// Body of `POST /api/sync`.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequestBody {
    /// The complete snapshot; replaces every row of the target table.
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<JsonValue>,
    pub api_key: String,
    /// Target table; ignored unless it is letters, digits and underscores only.
    #[serde(default)]
    pub table_name: Option<String>,
    /// Truncate (and reset identities) instead of delete, when the deployment lets callers choose.
    #[serde(default)]
    pub truncate_first: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncResponse {
    pub fn inserted(count: u64) -> Self {
        Self {
            success: true,
            inserted_count: Some(count),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            inserted_count: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
