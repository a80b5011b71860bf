//! Application state wiring the chat core to its concrete collaborators.
//!
//! The core types are generic over storage, backend, and credit service;
//! `AppState` pins them to the infra implementations.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use parley_core::chat::exchange::{ExchangeController, ExchangeSettings};
use parley_core::chat::session::ChatSession;
use parley_core::chat::store::SessionStore;
use parley_core::credit::reflector::BalanceReflector;
use parley_core::event::EventBus;
use parley_core::storage::kv_store::KvStore;
use parley_infra::config::load_client_config;
use parley_infra::filesystem::{resolve_data_dir, storage_dir};
use parley_infra::http::{HttpCompletionBackend, HttpCreditService};
use parley_infra::storage::{FileKvStore, InMemoryKvStore};
use parley_types::config::ClientConfig;
use parley_types::credit::BalanceSnapshot;
use parley_types::error::StorageError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Where the session mirrors its history.
#[derive(Debug)]
pub enum AppStorage {
    File(FileKvStore),
    Memory(InMemoryKvStore),
}

impl KvStore for AppStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            AppStorage::File(store) => store.get(key),
            AppStorage::Memory(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            AppStorage::File(store) => store.set(key, value),
            AppStorage::Memory(store) => store.set(key, value),
        }
    }
}

pub type AppSession = ChatSession<AppStorage>;
pub type AppExchange = ExchangeController<AppStorage, HttpCompletionBackend>;
pub type AppReflector = BalanceReflector<HttpCreditService>;

/// Background work started by [`AppState::start_balance_reflector`].
struct BalanceTasks {
    mount: JoinHandle<BalanceSnapshot>,
    runner: JoinHandle<()>,
}

/// Shared state for every CLI command.
pub struct AppState {
    pub config: ClientConfig,
    pub data_dir: PathBuf,
    pub session: Arc<AppSession>,
    pub exchange: Arc<AppExchange>,
    pub reflector: Arc<AppReflector>,
    shutdown: CancellationToken,
    balance_tasks: Mutex<Option<BalanceTasks>>,
}

impl AppState {
    /// Load config, open the session, and wire the controllers.
    ///
    /// With `ephemeral`, history lives in memory only.
    pub async fn init(ephemeral: bool) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_client_config(&data_dir).await;

        let storage = if ephemeral {
            AppStorage::Memory(InMemoryKvStore::with_quota(config.storage_quota_bytes))
        } else {
            tokio::fs::create_dir_all(&data_dir).await?;
            AppStorage::File(
                FileKvStore::new(storage_dir(&data_dir)).with_quota(config.storage_quota_bytes),
            )
        };

        Ok(Self::with_storage(config, data_dir, storage))
    }

    /// Wire everything on top of an already chosen storage.
    pub fn with_storage(config: ClientConfig, data_dir: PathBuf, storage: AppStorage) -> Self {
        let events = EventBus::default();
        let session = Arc::new(ChatSession::open(
            SessionStore::new(storage, config.storage_key.clone()),
            events,
        ));

        let client = reqwest::Client::new();
        let backend = HttpCompletionBackend::with_client(client.clone(), &config.completion_url);
        let credits = HttpCreditService::with_client(client, &config.balance_url);

        let exchange = Arc::new(ExchangeController::new(
            Arc::clone(&session),
            backend,
            ExchangeSettings::from_config(&config),
        ));
        let reflector = Arc::new(BalanceReflector::from_config(credits, &config));

        Self {
            config,
            data_dir,
            session,
            exchange,
            reflector,
            shutdown: CancellationToken::new(),
            balance_tasks: Mutex::new(None),
        }
    }

    /// Start mirroring the balance: one refresh now, then one per history change.
    pub fn start_balance_reflector(&self) {
        let events = self.session.subscribe();
        let mount = self.reflector.request_refresh();
        let runner = tokio::spawn(Arc::clone(&self.reflector).run(events, self.shutdown.child_token()));
        *self.balance_tasks() = Some(BalanceTasks { mount, runner });
    }

    /// Stop the reflector once it has handled every history change so far,
    /// and wait until the latest refresh is applied.
    pub async fn finish_balance_reflector(&self) -> BalanceSnapshot {
        self.shutdown.cancel();
        let tasks = self.balance_tasks().take();
        if let Some(BalanceTasks { mount, runner }) = tasks {
            if let Err(e) = runner.await {
                tracing::warn!(error = %e, "Balance reflector task ended abnormally");
            }
            let _ = mount.await;
        }
        self.reflector.snapshot()
    }

    fn balance_tasks(&self) -> std::sync::MutexGuard<'_, Option<BalanceTasks>> {
        self.balance_tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop background tasks.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
