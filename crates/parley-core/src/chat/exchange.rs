//! Exchange controller: one request/response round trip per send.
//!
//! A send appends the outgoing message, ships the whole history to the
//! completion backend, and appends the reply when it arrives. The generating
//! flag is raised before the outgoing append and is lowered on every exit
//! path, including a dropped future. Failed sends are not rolled back and
//! never produce a fabricated reply.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use parley_types::completion::{CompletionError, CompletionReply};
use parley_types::config::{BusyPolicy, ClientConfig};
use parley_types::event::SessionEvent;
use parley_types::message::{Message, TimestampStyle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::chat::backend::CompletionBackend;
use crate::chat::session::ChatSession;
use crate::storage::kv_store::KvStore;

/// Tunables for the exchange controller.
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub busy_policy: BusyPolicy,
    /// Deadline for the backend call.
    pub timeout: Duration,
    pub timestamp_style: TimestampStyle,
}

impl ExchangeSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            busy_policy: config.busy_policy,
            timeout: Duration::from_millis(config.request_timeout_ms),
            timestamp_style: config.timestamp_style,
        }
    }
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// Why a send did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The text was empty or whitespace.
    EmptyMessage,
    /// Another exchange is in flight and the busy policy rejects overlap.
    Busy,
}

/// How a send ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// The reply was appended to history.
    Replied(Message),
    /// The outgoing message stays in history; no reply was appended.
    Failed(CompletionError),
    /// History was not touched.
    Ignored(IgnoreReason),
}

/// Drives exchanges against a completion backend for one session.
pub struct ExchangeController<S: KvStore, B: CompletionBackend> {
    session: Arc<ChatSession<S>>,
    backend: B,
    settings: ExchangeSettings,
    /// Parent of every in-flight exchange's cancellation token.
    abort: Mutex<CancellationToken>,
}

impl<S: KvStore, B: CompletionBackend> ExchangeController<S, B> {
    pub fn new(session: Arc<ChatSession<S>>, backend: B, settings: ExchangeSettings) -> Self {
        Self {
            session,
            backend,
            settings,
            abort: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn session(&self) -> &Arc<ChatSession<S>> {
        &self.session
    }

    pub fn settings(&self) -> &ExchangeSettings {
        &self.settings
    }

    /// Cancel every exchange currently waiting on the backend.
    ///
    /// Exchanges started afterwards are unaffected.
    pub fn abort(&self) {
        let mut token = self.abort.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancellationToken::new();
    }

    /// Send `text` as the next user message and wait for the reply.
    pub async fn send(&self, text: &str) -> ExchangeOutcome {
        if text.trim().is_empty() {
            debug!("Ignoring empty message");
            return ExchangeOutcome::Ignored(IgnoreReason::EmptyMessage);
        }

        let exchange_id = Uuid::now_v7();
        self.run_exchange(exchange_id, text)
            .instrument(info_span!("exchange", %exchange_id))
            .await
    }

    async fn run_exchange(&self, exchange_id: Uuid, text: &str) -> ExchangeOutcome {
        let cancel = self.abort_token().child_token();
        let outgoing = Message::outgoing(text, self.settings.timestamp_style.label_now());
        let reject_if_busy = self.settings.busy_policy == BusyPolicy::Reject;

        let Some(history) = self.session.begin_exchange(outgoing, reject_if_busy) else {
            info!("Send ignored while a reply is being generated");
            return ExchangeOutcome::Ignored(IgnoreReason::Busy);
        };
        let _generating = GeneratingGuard {
            session: &self.session,
        };

        let started = Instant::now();
        debug!(messages = history.len(), "Requesting completion");

        match self.request(&history, &cancel).await {
            Ok(reply) => {
                let incoming =
                    Message::incoming(reply.content, self.settings.timestamp_style.label_now());
                self.session.append(incoming.clone());
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    history_len = history.len() + 1,
                    "Exchange completed"
                );
                ExchangeOutcome::Replied(incoming)
            }
            Err(error) => {
                warn!(%error, "Exchange failed, no reply appended");
                self.session.events().publish(SessionEvent::ExchangeFailed {
                    exchange_id,
                    error: error.to_string(),
                });
                ExchangeOutcome::Failed(error)
            }
        }
    }

    async fn request(
        &self,
        history: &[Message],
        cancel: &CancellationToken,
    ) -> Result<CompletionReply, CompletionError> {
        let timeout = self.settings.timeout;
        tokio::select! {
            _ = cancel.cancelled() => Err(CompletionError::Aborted),
            result = tokio::time::timeout(timeout, self.backend.complete(history)) => {
                result.unwrap_or_else(|_| {
                    Err(CompletionError::Timeout {
                        ms: timeout.as_millis() as u64,
                    })
                })
            }
        }
    }

    fn abort_token(&self) -> CancellationToken {
        self.abort
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Lowers the generating flag when the exchange ends, however it ends.
struct GeneratingGuard<'a, S: KvStore> {
    session: &'a ChatSession<S>,
}

impl<S: KvStore> Drop for GeneratingGuard<'_, S> {
    fn drop(&mut self) {
        self.session.end_exchange();
    }
}
