//! Balance reflector: keeps a read-only mirror of the credit balance.
//!
//! A refresh is requested once on mount and again for every history change
//! announced on the session event bus. A single send therefore refreshes at
//! least twice; refreshes are cheap and idempotent so this is not coalesced.
//!
//! Overlapping refreshes are resolved by ticket: only the most recently
//! requested refresh may publish a result or lower `is_loading`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parley_types::config::ClientConfig;
use parley_types::credit::{BalanceError, BalanceSnapshot};
use parley_types::event::SessionEvent;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::credit::service::CreditService;

/// Mirrors the external credit balance and exposes a loading flag.
///
/// Never touches the chat history; it only observes session events.
pub struct BalanceReflector<C: CreditService> {
    service: C,
    timeout: Duration,
    /// Ticket of the most recently requested refresh.
    latest: AtomicU64,
    snapshot: watch::Sender<BalanceSnapshot>,
}

impl<C: CreditService> BalanceReflector<C> {
    pub fn new(service: C, timeout: Duration) -> Self {
        let (snapshot, _) = watch::channel(BalanceSnapshot::default());
        Self {
            service,
            timeout,
            latest: AtomicU64::new(0),
            snapshot,
        }
    }

    pub fn from_config(service: C, config: &ClientConfig) -> Self {
        Self::new(service, Duration::from_millis(config.balance_timeout_ms))
    }

    /// The current mirrored state.
    pub fn snapshot(&self) -> BalanceSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn balance(&self) -> Option<f64> {
        self.snapshot.borrow().balance
    }

    pub fn is_loading(&self) -> bool {
        self.snapshot.borrow().is_loading
    }

    /// Number of refreshes requested so far.
    pub fn requested(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Watch snapshots as they change.
    pub fn subscribe(&self) -> watch::Receiver<BalanceSnapshot> {
        self.snapshot.subscribe()
    }

    /// Fetch the balance and wait for the result.
    pub async fn refresh(&self) -> BalanceSnapshot {
        let ticket = self.begin_refresh();
        self.finish_refresh(ticket).await
    }

    /// Mark a refresh as requested and return its ticket.
    ///
    /// `is_loading` is raised here, before any I/O starts.
    fn begin_refresh(&self) -> u64 {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshot.send_modify(|s| s.is_loading = true);
        debug!(ticket, "Balance refresh requested");
        ticket
    }

    async fn finish_refresh(&self, ticket: u64) -> BalanceSnapshot {
        let result = match tokio::time::timeout(self.timeout, self.service.fetch_balance()).await {
            Ok(result) => result,
            Err(_) => Err(BalanceError::Timeout {
                ms: self.timeout.as_millis() as u64,
            }),
        };

        let applied = self.snapshot.send_if_modified(|s| {
            if self.latest.load(Ordering::SeqCst) != ticket {
                return false;
            }
            match &result {
                Ok(value) => {
                    s.balance = Some(*value);
                    s.last_error = None;
                }
                Err(e) => {
                    s.balance = None;
                    s.last_error = Some(e.to_string());
                }
            }
            s.is_loading = false;
            true
        });

        match (&result, applied) {
            (_, false) => debug!(ticket, "Balance refresh superseded by a newer request"),
            (Ok(value), true) => debug!(ticket, balance = *value, "Balance refreshed"),
            (Err(e), true) => warn!(ticket, error = %e, "Balance refresh failed"),
        }
        self.snapshot()
    }
}

impl<C: CreditService + 'static> BalanceReflector<C> {
    /// Request a refresh without waiting for it.
    pub fn request_refresh(self: &Arc<Self>) -> JoinHandle<BalanceSnapshot> {
        let ticket = self.begin_refresh();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.finish_refresh(ticket).await })
    }

    /// Refresh on every history change until `shutdown` fires or the bus closes.
    ///
    /// Events already queued when `shutdown` fires are still handled, and
    /// the last refresh issued is awaited before returning, so its result is
    /// applied. A lagged receiver has missed at least one history change, so
    /// it triggers one catch-up refresh.
    pub async fn run(
        self: Arc<Self>,
        mut events: broadcast::Receiver<SessionEvent>,
        shutdown: CancellationToken,
    ) {
        info!("Balance reflector subscribed to session events");
        let mut last: Option<JoinHandle<BalanceSnapshot>> = None;
        loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Ok(event) if event.is_history_change() => {
                        last = Some(self.request_refresh());
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Balance reflector lagged behind session events");
                        last = Some(self.request_refresh());
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.cancelled() => break,
            }
        }
        if let Some(handle) = last {
            let _ = handle.await;
        }
        debug!("Balance reflector stopped");
    }
}
