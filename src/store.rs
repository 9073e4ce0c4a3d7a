//! Remote chat store — HTTP access to a ticket's transcript.
//!
//! DESIGN
//! ======
//! Stateless: every call is a single request with no retry. The `ChatStore`
//! trait is the seam the polling cache and controller depend on, so both can
//! run against in-memory mocks. Response bodies are read as text and handed
//! to `parse_snapshot`, keeping validation pure and testable.

use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use crate::config::ChatConfig;
use crate::types::{ChatError, ChatSnapshot, NewMessage, TicketId, parse_snapshot};

// =============================================================================
// TRAIT
// =============================================================================

/// Read/append access to ticket transcripts. Enables mocking in tests.
#[async_trait::async_trait]
pub trait ChatStore: Send + Sync {
    /// Fetch the full transcript and suggestion set for `ticket`.
    ///
    /// # Errors
    ///
    /// [`ChatError::Network`] on transport failure, [`ChatError::Status`] on a
    /// non-success status, [`ChatError::Decode`] on a malformed body.
    async fn fetch_snapshot(&self, ticket: &TicketId) -> Result<ChatSnapshot, ChatError>;

    /// Append a message to `ticket`. Visible to later fetches once the backend
    /// has stored it.
    ///
    /// # Errors
    ///
    /// [`ChatError::Network`] on transport failure, [`ChatError::Status`] on a
    /// non-success status.
    async fn append_message(&self, ticket: &TicketId, message: &NewMessage) -> Result<(), ChatError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpChatStore {
    http: reqwest::Client,
    api_base: Url,
}

impl HttpChatStore {
    /// Build a store against `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if the API URL does not parse, or
    /// [`ChatError::HttpClientBuild`] if the TLS backend fails to initialize.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let api_base = config.api_base()?;
        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ChatError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_base })
    }

    /// `{base}/api/tickets/{ticket}/{leaf}`, with the ticket id escaped as a
    /// single path segment.
    fn ticket_url(&self, ticket: &TicketId, leaf: &str) -> Result<Url, ChatError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| ChatError::Config(format!("API URL cannot be a base: '{}'", self.api_base)))?
            .pop_if_empty()
            .extend(["api", "tickets", ticket.as_str(), leaf]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ChatStore for HttpChatStore {
    async fn fetch_snapshot(&self, ticket: &TicketId) -> Result<ChatSnapshot, ChatError> {
        let url = self.ticket_url(ticket, "chats")?;
        debug!(%ticket, %url, "fetching chat snapshot");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ChatError::Status { status: status.as_u16(), body: text });
        }

        parse_snapshot(&text)
    }

    async fn append_message(&self, ticket: &TicketId, message: &NewMessage) -> Result<(), ChatError> {
        let url = self.ticket_url(ticket, "messages")?;
        debug!(%ticket, %url, "appending message");

        let response = self
            .http
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status: status.as_u16(), body });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
