//! # ticket-chat
//!
//! Customer-service chat client for a help-desk backend. Polls a ticket's
//! transcript and suggestions, keeps the latest snapshot cached, and lets an
//! agent compose and send replies.
//!
//! Layering, leaves first: `store` (HTTP), `cache` (per-ticket polling),
//! `draft` (local compose state), `controller` (view model and send
//! sequencing). `token` holds the optional preview-mode credential.

pub mod cache;
pub mod config;
pub mod controller;
pub mod draft;
pub mod store;
pub mod token;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use cache::{CacheState, CacheStatus, POLL_INTERVAL, PollingCache, Subscription};
pub use config::ChatConfig;
pub use controller::{ChatEvent, ChatSyncController, SendOutcome, SkipReason, ViewModel};
pub use store::{ChatStore, HttpChatStore};
pub use types::{ChatError, ChatSnapshot, Message, NewMessage, SenderBy, Suggest, TicketId};
