//! Chat types — ticket transcript model, wire parsing, and errors.
//!
//! DESIGN
//! ======
//! The backend's payload is validated here and nowhere else. Everything past
//! `parse_snapshot` works with the canonical `SenderBy` enum and never sees
//! the raw spellings (`costumerService` on reads, `customerService` on
//! writes).

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by chat store, cache, and token operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response (DNS, connect, reset, timeout).
    #[error("network request failed: {0}")]
    Network(String),

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned status {status}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected schema.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// Reading or writing the local state file failed.
    #[error("local state storage failed: {0}")]
    Storage(String),

    /// Terminal input or output failed.
    #[error("console I/O failed: {0}")]
    Io(String),
}

// =============================================================================
// TICKET ID
// =============================================================================

/// Opaque key for one customer-service conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TicketId(String);

impl TicketId {
    /// Build a ticket id, rejecting empty or whitespace-only input. The
    /// value is kept verbatim otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] when `raw` is blank.
    pub fn new(raw: impl Into<String>) -> Result<Self, ChatError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ChatError::Config("ticket id must not be empty".into()));
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// MESSAGE TYPES
// =============================================================================

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderBy {
    /// The end customer who opened the ticket.
    Client,
    /// A customer-service agent (this client's user).
    Agent,
}

impl SenderBy {
    /// Normalize a wire spelling. Both agent spellings seen on the backend map
    /// to [`SenderBy::Agent`].
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "client" => Some(Self::Client),
            "costumerService" | "customerService" => Some(Self::Agent),
            _ => None,
        }
    }

    /// Spelling expected by the write endpoint.
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Agent => "customerService",
        }
    }
}

impl Serialize for SenderBy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

/// A single transcript entry, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: SenderBy,
    pub content: String,
    /// Server-provided timestamp text, kept verbatim.
    pub created_at: String,
}

/// One suggestion bundle: quick-reply options and free-text suggestions.
/// Either list may be absent on the wire and reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Suggest {
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub suggests: Vec<String>,
}

/// Full payload for one ticket at one poll tick. Always replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub messages: Vec<Message>,
    pub suggestions: Vec<Suggest>,
}

impl ChatSnapshot {
    /// The active suggestion bundle. Only the first one is ever shown.
    #[must_use]
    pub fn active_suggestion(&self) -> Option<&Suggest> {
        self.suggestions.first()
    }
}

/// Body of `POST /api/tickets/{id}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    #[serde(rename = "senderBy")]
    pub sender: SenderBy,
    pub content: String,
}

impl NewMessage {
    /// An agent reply, the only kind this client writes.
    #[must_use]
    pub fn agent(content: impl Into<String>) -> Self {
        Self { sender: SenderBy::Agent, content: content.into() }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct WireSnapshot {
    messages: Vec<WireMessage>,
    suggest: Vec<Suggest>,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(rename = "senderBy")]
    sender_by: String,
    content: String,
    #[serde(rename = "createdAt", alias = "createAt")]
    created_at: String,
}

// =============================================================================
// PARSING
// =============================================================================

/// Validate and normalize a `GET /api/tickets/{id}/chats` body.
///
/// # Errors
///
/// Returns [`ChatError::Decode`] if the JSON is malformed, a required field is
/// missing or mistyped, or a message carries an unknown `senderBy`.
pub fn parse_snapshot(json: &str) -> Result<ChatSnapshot, ChatError> {
    let wire: WireSnapshot = serde_json::from_str(json).map_err(|e| ChatError::Decode(e.to_string()))?;

    let messages = wire
        .messages
        .into_iter()
        .enumerate()
        .map(|(idx, m)| {
            let sender = SenderBy::from_wire(&m.sender_by)
                .ok_or_else(|| ChatError::Decode(format!("messages[{idx}]: unknown senderBy '{}'", m.sender_by)))?;
            Ok(Message { sender, content: m.content, created_at: m.created_at })
        })
        .collect::<Result<Vec<_>, ChatError>>()?;

    Ok(ChatSnapshot { messages, suggestions: wire.suggest })
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
