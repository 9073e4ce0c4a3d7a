//! In-memory `ChatStore` and snapshot builders shared by cache and
//! controller tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::oneshot;

use crate::store::ChatStore;
use crate::types::{ChatError, ChatSnapshot, Message, NewMessage, SenderBy, Suggest, TicketId};

type FetchResult = Result<ChatSnapshot, ChatError>;
type AppendResult = Result<(), ChatError>;

enum Scripted<T> {
    Now(T),
    Gated(oneshot::Receiver<T>),
}

/// Scripted store. Fetches pop queued results first, then fall back to
/// `default_fetch`. Gated entries wait until the test releases them.
pub(crate) struct MockStore {
    fetches: AtomicUsize,
    fetch_script: Mutex<VecDeque<Scripted<FetchResult>>>,
    default_fetch: Mutex<FetchResult>,
    append_script: Mutex<VecDeque<Scripted<AppendResult>>>,
    appended: Mutex<Vec<(TicketId, NewMessage)>>,
}

impl MockStore {
    pub(crate) fn new(default_fetch: FetchResult) -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            fetch_script: Mutex::new(VecDeque::new()),
            default_fetch: Mutex::new(default_fetch),
            append_script: Mutex::new(VecDeque::new()),
            appended: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn push_fetch(&self, result: FetchResult) {
        self.fetch_script.lock().unwrap().push_back(Scripted::Now(result));
    }

    pub(crate) fn gate_fetch(&self) -> oneshot::Sender<FetchResult> {
        let (tx, rx) = oneshot::channel();
        self.fetch_script.lock().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    pub(crate) fn push_append(&self, result: AppendResult) {
        self.append_script.lock().unwrap().push_back(Scripted::Now(result));
    }

    pub(crate) fn gate_append(&self) -> oneshot::Sender<AppendResult> {
        let (tx, rx) = oneshot::channel();
        self.append_script.lock().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    pub(crate) fn appended(&self) -> Vec<(TicketId, NewMessage)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatStore for MockStore {
    async fn fetch_snapshot(&self, _ticket: &TicketId) -> Result<ChatSnapshot, ChatError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.fetch_script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Now(result)) => result,
            Some(Scripted::Gated(rx)) => rx.await.unwrap_or_else(|_| Err(ChatError::Network("gate dropped".into()))),
            None => self.default_fetch.lock().unwrap().clone(),
        }
    }

    async fn append_message(&self, ticket: &TicketId, message: &NewMessage) -> Result<(), ChatError> {
        let next = self.append_script.lock().unwrap().pop_front();
        let result = match next {
            Some(Scripted::Now(result)) => result,
            Some(Scripted::Gated(rx)) => rx.await.unwrap_or_else(|_| Err(ChatError::Network("gate dropped".into()))),
            None => Ok(()),
        };
        if result.is_ok() {
            self.appended.lock().unwrap().push((ticket.clone(), message.clone()));
        }
        result
    }
}

pub(crate) fn ticket(raw: &str) -> TicketId {
    TicketId::new(raw).unwrap()
}

pub(crate) fn message(sender: SenderBy, content: &str) -> Message {
    Message { sender, content: content.to_string(), created_at: "2024-05-01T10:00:00Z".to_string() }
}

pub(crate) fn snapshot(messages: Vec<Message>) -> ChatSnapshot {
    ChatSnapshot { messages, suggestions: Vec::new() }
}

pub(crate) fn snapshot_with_suggestions(messages: Vec<Message>, suggests: &[&str]) -> ChatSnapshot {
    ChatSnapshot {
        messages,
        suggestions: vec![
            Suggest {
                options: vec!["Yes".to_string(), "No".to_string()],
                suggests: suggests.iter().map(|s| (*s).to_string()).collect(),
            },
            Suggest { options: vec!["stale".to_string()], suggests: vec!["stale".to_string()] },
        ],
    }
}
