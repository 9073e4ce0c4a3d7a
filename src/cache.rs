//! Polling cache — one periodically refreshed snapshot per ticket.
//!
//! DESIGN
//! ======
//! The first subscriber for a ticket creates its entry and spawns a poller.
//! The poller fetches immediately, then every `POLL_INTERVAL`, and also
//! whenever `invalidate` wakes it. Each fetch runs as its own task and writes
//! its result into a `watch` channel on completion, so overlapping fetches
//! are allowed and whichever resolves last wins.
//!
//! TRADE-OFFS
//! ==========
//! There is no sequence guard: a slow, older response can overwrite a newer
//! one until the next tick replaces it. Failed fetches are retried only by
//! the next tick, forever, without backoff.
//!
//! When the last subscription drops, the poller is aborted and the entry
//! removed. In-flight fetches keep running but their results are discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::store::ChatStore;
use crate::types::{ChatError, ChatSnapshot, TicketId};

/// Fixed refresh period for every subscribed ticket.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

// =============================================================================
// CACHE STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// No fetch has resolved yet.
    Loading,
    /// The latest resolved fetch succeeded.
    Ready,
    /// The latest resolved fetch failed.
    Error,
}

/// What subscribers observe for one ticket.
#[derive(Debug, Clone)]
pub struct CacheState {
    pub status: CacheStatus,
    /// Last successfully fetched snapshot. Kept across `Error` transitions.
    pub data: Option<ChatSnapshot>,
    /// Cause of the most recent failure, cleared on the next success.
    pub last_error: Option<ChatError>,
}

impl CacheState {
    fn loading() -> Self {
        Self { status: CacheStatus::Loading, data: None, last_error: None }
    }

    fn apply(&mut self, result: Result<ChatSnapshot, ChatError>) {
        match result {
            Ok(snapshot) => {
                self.status = CacheStatus::Ready;
                self.data = Some(snapshot);
                self.last_error = None;
            }
            Err(e) => {
                self.status = CacheStatus::Error;
                self.last_error = Some(e);
            }
        }
    }
}

// =============================================================================
// CACHE
// =============================================================================

struct Entry {
    tx: Arc<watch::Sender<CacheState>>,
    refresh: Arc<Notify>,
    alive: Arc<AtomicBool>,
    poller: JoinHandle<()>,
    subscribers: usize,
}

/// Shared handle; clones refer to the same set of entries.
#[derive(Clone)]
pub struct PollingCache {
    store: Arc<dyn ChatStore>,
    entries: Arc<Mutex<HashMap<TicketId, Entry>>>,
}

impl PollingCache {
    #[must_use]
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store, entries: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// The store this cache reads through. Writes go through it too.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ChatStore> {
        &self.store
    }

    /// Subscribe to `ticket`, starting its poller if nobody else is watching.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn subscribe(&self, ticket: &TicketId) -> Subscription {
        let mut entries = self.lock_entries();

        let rx = if let Some(entry) = entries.get_mut(ticket) {
            entry.subscribers += 1;
            debug!(%ticket, subscribers = entry.subscribers, "joined existing chat poller");
            entry.tx.subscribe()
        } else {
            let (tx, rx) = watch::channel(CacheState::loading());
            let tx = Arc::new(tx);
            let refresh = Arc::new(Notify::new());
            let alive = Arc::new(AtomicBool::new(true));
            let poller = spawn_poller(
                Arc::clone(&self.store),
                ticket.clone(),
                Arc::clone(&tx),
                Arc::clone(&refresh),
                Arc::clone(&alive),
            );
            info!(%ticket, interval_secs = POLL_INTERVAL.as_secs(), "chat polling started");
            entries.insert(ticket.clone(), Entry { tx, refresh, alive, poller, subscribers: 1 });
            rx
        };

        Subscription { ticket: ticket.clone(), rx, cache: self.clone() }
    }

    /// Force an out-of-band fetch for `ticket` without waiting for the timer.
    /// Returns `false` when nobody is subscribed to it.
    pub fn invalidate(&self, ticket: &TicketId) -> bool {
        let entries = self.lock_entries();
        if let Some(entry) = entries.get(ticket) {
            entry.refresh.notify_one();
            debug!(%ticket, "chat snapshot invalidated");
            true
        } else {
            debug!(%ticket, "invalidate ignored, no subscribers");
            false
        }
    }

    /// Number of tickets currently being polled.
    #[must_use]
    pub fn active_tickets(&self) -> usize {
        self.lock_entries().len()
    }

    fn release(&self, ticket: &TicketId) {
        let mut entries = self.lock_entries();
        let Some(entry) = entries.get_mut(ticket) else {
            return;
        };
        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers > 0 {
            return;
        }
        if let Some(entry) = entries.remove(ticket) {
            entry.alive.store(false, Ordering::Release);
            entry.poller.abort();
            info!(%ticket, "chat polling stopped");
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<TicketId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// A live interest in one ticket. Dropping it unsubscribes.
pub struct Subscription {
    ticket: TicketId,
    rx: watch::Receiver<CacheState>,
    cache: PollingCache,
}

impl Subscription {
    #[must_use]
    pub fn ticket(&self) -> &TicketId {
        &self.ticket
    }

    /// Copy of the latest cache state.
    #[must_use]
    pub fn current(&self) -> CacheState {
        self.rx.borrow().clone()
    }

    /// A receiver that reports changes after the current value.
    #[must_use]
    pub fn updates(&self) -> watch::Receiver<CacheState> {
        let mut rx = self.rx.clone();
        rx.borrow_and_update();
        rx
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cache.release(&self.ticket);
    }
}

// =============================================================================
// POLLER
// =============================================================================

fn spawn_poller(
    store: Arc<dyn ChatStore>,
    ticket: TicketId,
    tx: Arc<watch::Sender<CacheState>>,
    refresh: Arc<Notify>,
    alive: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = interval.tick() => {}
                () = refresh.notified() => debug!(%ticket, "forced chat refresh"),
            }
            spawn_fetch(Arc::clone(&store), ticket.clone(), Arc::clone(&tx), Arc::clone(&alive));
        }
    })
}

fn spawn_fetch(store: Arc<dyn ChatStore>, ticket: TicketId, tx: Arc<watch::Sender<CacheState>>, alive: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let result = store.fetch_snapshot(&ticket).await;

        if !alive.load(Ordering::Acquire) {
            debug!(%ticket, "discarding chat fetch that resolved after unsubscribe");
            return;
        }

        match &result {
            Ok(snapshot) => debug!(%ticket, messages = snapshot.messages.len(), "chat snapshot refreshed"),
            Err(e) => warn!(%ticket, error = %e, "chat fetch failed, retrying on next tick"),
        }
        tx.send_modify(|state| state.apply(result));
    });
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
