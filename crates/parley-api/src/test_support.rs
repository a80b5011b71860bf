//! Localhost stand-ins for the completion backend and credit service.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Json;
use axum::Router;
use axum::routing::{get, post};
use parley_infra::storage::InMemoryKvStore;
use parley_types::config::ClientConfig;
use serde_json::{Value, json};

use crate::state::{AppState, AppStorage};

/// Request counters for the two endpoints.
#[derive(Clone, Default)]
pub struct Hits {
    pub completions: Arc<AtomicUsize>,
    pub balances: Arc<AtomicUsize>,
}

impl Hits {
    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    pub fn balances(&self) -> usize {
        self.balances.load(Ordering::SeqCst)
    }
}

/// Serve `/api/openai` (always `Ahoy!`) and `/api/credits` (always `balance`).
pub async fn spawn_services(balance: f64) -> (String, Hits) {
    let hits = Hits::default();
    let completions = hits.completions.clone();
    let balances = hits.balances.clone();

    let router = Router::new()
        .route(
            "/api/openai",
            post(move |Json(_body): Json<Value>| {
                let completions = completions.clone();
                async move {
                    completions.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "content": "Ahoy!" }))
                }
            }),
        )
        .route(
            "/api/credits",
            get(move || {
                let balances = balances.clone();
                async move {
                    balances.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "balance": balance }))
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), hits)
}

/// Config whose endpoints point at `base`.
pub fn config_for(base: &str) -> ClientConfig {
    ClientConfig {
        completion_url: format!("{base}/api/openai"),
        balance_url: format!("{base}/api/credits"),
        ..ClientConfig::default()
    }
}

/// In-memory app state built from `config`.
pub fn state_with(config: ClientConfig) -> AppState {
    AppState::with_storage(
        config,
        PathBuf::from("/nonexistent"),
        AppStorage::Memory(InMemoryKvStore::new()),
    )
}

/// In-memory app state pointed at `base`.
pub fn state_for(base: &str) -> AppState {
    state_with(config_for(base))
}
