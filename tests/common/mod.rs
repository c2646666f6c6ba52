//! Spins the real router up on an ephemeral port, backed by the in-memory store.

#![allow(dead_code)]

use snapshot_sync::transport::http::{create_router, AppState};
use snapshot_sync::{AuthGate, ClearPolicy, MemorySnapshotStore, SyncService, SyncSettings, TableSchema};
use std::net::SocketAddr;
use std::sync::Arc;

pub const API_KEY: &str = "test-key";

pub struct TestServer {
    pub base_url: String,
    pub store: MemorySnapshotStore,
    pub client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn sync(&self, body: serde_json::Value) -> (u16, serde_json::Value) {
        let resp = self
            .client
            .post(self.url("/api/sync"))
            .json(&body)
            .send()
            .await
            .expect("request failed");
        let status = resp.status().as_u16();
        let json = resp.json().await.expect("response is not JSON");
        (status, json)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn(schema: TableSchema, policy: ClearPolicy) -> TestServer {
    let store = MemorySnapshotStore::new();
    let columns: Vec<&str> = schema.column_names().collect();
    store.create_table("clients", &columns).await;
    store.create_table("clients_2024", &columns).await;

    let service = SyncService::new(
        Arc::new(store.clone()),
        schema,
        SyncSettings {
            default_table: "clients".to_string(),
            clear_policy: policy,
            lock_table: true,
        },
    );
    let app_state = AppState {
        sync_service: Arc::new(service),
        auth: Arc::new(AuthGate::new(API_KEY)),
        max_body_bytes: 50 * 1024 * 1024,
    };
    let router = create_router(app_state);

    // Bind to an ephemeral port to avoid conflicts with a running server.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
        handle,
    }
}

pub async fn spawn_narrow() -> TestServer {
    spawn(TableSchema::narrow(), ClearPolicy::Delete).await
}
