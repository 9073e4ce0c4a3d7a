//! Chat sync controller — the single coordination point between the polling
//! cache and the local draft.
//!
//! ARCHITECTURE
//! ============
//! A controller owns one `Subscription` (the mounted ticket view), the draft,
//! and the suggestions latch. Presentation reads `view_model()` and reacts to
//! `updates()` and `events()`; user actions call `select_suggestion`,
//! `set_draft`, `toggle_suggestions_panel`, or `send`.
//!
//! Local state sits behind a `std::sync::Mutex` that is never held across an
//! await, so the view model stays readable while a send is in flight.
//!
//! SEND SEQUENCING
//! ===============
//! A successful send clears the draft, then invalidates the ticket so the
//! poller fetches right away instead of on its next tick. The draft is never
//! touched on failure. At most one send runs at a time per controller; a
//! second call while one is pending is skipped rather than queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::cache::{CacheState, CacheStatus, PollingCache, Subscription};
use crate::draft::{DraftState, SuggestionsPanel};
use crate::types::{ChatError, Message, NewMessage, Suggest, TicketId};

const EVENT_CAPACITY: usize = 16;

// =============================================================================
// VIEW MODEL
// =============================================================================

/// Everything presentation needs to draw one ticket view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub status: CacheStatus,
    /// Empty unless `status` is `Ready`.
    pub messages: Vec<Message>,
    /// The first suggestion bundle of the snapshot, if any.
    pub suggestions: Option<Suggest>,
    pub draft_text: String,
    pub suggestions_panel_open: bool,
    pub send_in_flight: bool,
}

/// Notifications raised by the send path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    MessageSent { ticket: TicketId, content: String },
    SendFailed { ticket: TicketId, error: ChatError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend accepted the message.
    Sent,
    /// Nothing was sent.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The view is still loading or the last fetch failed.
    NotReady,
    /// The draft is empty or whitespace.
    EmptyDraft,
    /// Another send from this controller has not resolved yet.
    SendInFlight,
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Default)]
struct LocalState {
    draft: DraftState,
    panel: SuggestionsPanel,
}

pub struct ChatSyncController {
    cache: PollingCache,
    subscription: Subscription,
    local: Mutex<LocalState>,
    sending: AtomicBool,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatSyncController {
    /// Mount a view for `ticket`, subscribing to its snapshot.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn mount(cache: &PollingCache, ticket: TicketId) -> Self {
        let subscription = cache.subscribe(&ticket);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        info!(%ticket, "chat view mounted");
        Self {
            cache: cache.clone(),
            subscription,
            local: Mutex::new(LocalState::default()),
            sending: AtomicBool::new(false),
            events,
        }
    }

    #[must_use]
    pub fn ticket(&self) -> &TicketId {
        self.subscription.ticket()
    }

    /// Derive the current view from the cached snapshot and local state.
    #[must_use]
    pub fn view_model(&self) -> ViewModel {
        let CacheState { status, data, .. } = self.subscription.current();
        let local = self.lock_local();
        let draft_text = local.draft.current().to_owned();
        let send_in_flight = self.sending.load(Ordering::Acquire);

        match (status, data) {
            (CacheStatus::Ready, Some(snapshot)) => {
                let suggestions_panel_open = local.panel.is_open(snapshot.messages.is_empty());
                ViewModel {
                    status,
                    suggestions: snapshot.suggestions.into_iter().next(),
                    messages: snapshot.messages,
                    draft_text,
                    suggestions_panel_open,
                    send_in_flight,
                }
            }
            _ => ViewModel {
                status,
                messages: Vec::new(),
                suggestions: None,
                draft_text,
                suggestions_panel_open: false,
                send_in_flight,
            },
        }
    }

    /// Receiver that fires whenever the ticket's cache state changes.
    #[must_use]
    pub fn updates(&self) -> watch::Receiver<CacheState> {
        self.subscription.updates()
    }

    /// Receiver for send notifications raised after this call.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn draft_text(&self) -> String {
        self.lock_local().draft.current().to_owned()
    }

    /// Keystroke path: replace the draft.
    pub fn set_draft(&self, text: impl Into<String>) {
        self.lock_local().draft.set_text(text);
    }

    /// Copy a suggestion into the draft without sending it.
    pub fn select_suggestion(&self, text: &str) {
        self.lock_local().draft.set_text(text);
    }

    pub fn toggle_suggestions_panel(&self, open: bool) {
        self.lock_local().panel.toggle(open);
    }

    /// Send the current draft as an agent reply.
    ///
    /// # Errors
    ///
    /// Returns the store's error when the append fails. The draft is left as
    /// it was and a [`ChatEvent::SendFailed`] is raised.
    pub async fn send(&self) -> Result<SendOutcome, ChatError> {
        if self.subscription.current().status != CacheStatus::Ready {
            return Ok(SendOutcome::Skipped(SkipReason::NotReady));
        }

        let content = {
            let local = self.lock_local();
            if !local.draft.is_sendable() {
                return Ok(SendOutcome::Skipped(SkipReason::EmptyDraft));
            }
            local.draft.current().to_owned()
        };

        let Some(_in_flight) = InFlight::acquire(&self.sending) else {
            return Ok(SendOutcome::Skipped(SkipReason::SendInFlight));
        };

        let ticket = self.ticket().clone();
        let message = NewMessage::agent(content);
        match self.cache.store().append_message(&ticket, &message).await {
            Ok(()) => {
                self.lock_local().draft.clear();
                self.cache.invalidate(&ticket);
                info!(%ticket, "message sent");
                let _ = self.events.send(ChatEvent::MessageSent { ticket, content: message.content });
                Ok(SendOutcome::Sent)
            }
            Err(e) => {
                warn!(%ticket, error = %e, "message send failed, draft kept");
                let _ = self.events.send(ChatEvent::SendFailed { ticket, error: e.clone() });
                Err(e)
            }
        }
    }

    fn lock_local(&self) -> MutexGuard<'_, LocalState> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the per-controller send slot; released on drop, including when the
/// send future is cancelled mid-request.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
