use super::*;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::{Value, json};

use crate::types::SenderBy;

#[derive(Clone, Default)]
struct Backend {
    posted: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn chats(Path(id): Path<String>) -> impl IntoResponse {
    match id.as_str() {
        "42" => (
            StatusCode::OK,
            json!({
                "messages": [{ "senderBy": "costumerService", "content": "Hi!", "createdAt": "2024-05-01T10:00:00Z" }],
                "suggest": [{ "options": ["Yes"], "suggests": ["Can you clarify?"] }]
            })
            .to_string(),
        ),
        "a/b" => (StatusCode::OK, json!({ "messages": [], "suggest": [] }).to_string()),
        "broken" => (StatusCode::OK, "{\"messages\": 5}".to_string()),
        _ => (StatusCode::NOT_FOUND, "no such ticket".to_string()),
    }
}

async fn append(State(backend): State<Backend>, Path(id): Path<String>, Json(body): Json<Value>) -> StatusCode {
    if id == "closed" {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    backend.posted.lock().unwrap().push((id, body));
    StatusCode::CREATED
}

async fn spawn_backend() -> (HttpChatStore, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/tickets/{id}/chats", get(chats))
        .route("/api/tickets/{id}/messages", post(append))
        .with_state(backend.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ChatConfig::default().with_api_url(&format!("http://{addr}")).unwrap();
    (HttpChatStore::new(&config).unwrap(), backend)
}

fn ticket(raw: &str) -> TicketId {
    TicketId::new(raw).unwrap()
}

// =============================================================================
// fetch_snapshot
// =============================================================================

#[tokio::test]
async fn fetch_snapshot_parses_and_normalizes() {
    let (store, _) = spawn_backend().await;
    let snap = store.fetch_snapshot(&ticket("42")).await.unwrap();
    assert_eq!(snap.messages.len(), 1);
    assert_eq!(snap.messages[0].sender, SenderBy::Agent);
    assert_eq!(snap.messages[0].content, "Hi!");
    assert_eq!(snap.active_suggestion().unwrap().suggests, vec!["Can you clarify?"]);
}

#[tokio::test]
async fn fetch_snapshot_encodes_ticket_segment() {
    let (store, _) = spawn_backend().await;
    let snap = store.fetch_snapshot(&ticket("a/b")).await.unwrap();
    assert!(snap.messages.is_empty());
}

#[tokio::test]
async fn fetch_snapshot_malformed_body_is_decode_error() {
    let (store, _) = spawn_backend().await;
    let err = store.fetch_snapshot(&ticket("broken")).await.unwrap_err();
    assert!(matches!(err, ChatError::Decode(_)));
}

#[tokio::test]
async fn fetch_snapshot_not_found_is_status_error() {
    let (store, _) = spawn_backend().await;
    let err = store.fetch_snapshot(&ticket("missing")).await.unwrap_err();
    assert!(matches!(err, ChatError::Status { status: 404, ref body } if body == "no such ticket"));
}

#[tokio::test]
async fn fetch_snapshot_refused_connection_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ChatConfig::default().with_api_url(&format!("http://{addr}")).unwrap();
    let store = HttpChatStore::new(&config).unwrap();
    let err = store.fetch_snapshot(&ticket("42")).await.unwrap_err();
    assert!(matches!(err, ChatError::Network(_)));
}

// =============================================================================
// append_message
// =============================================================================

#[tokio::test]
async fn append_message_posts_customer_service_body() {
    let (store, backend) = spawn_backend().await;
    store
        .append_message(&ticket("42"), &NewMessage::agent("Can you clarify?"))
        .await
        .unwrap();

    let posted = backend.posted.lock().unwrap().clone();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].0, "42");
    assert_eq!(posted[0].1, json!({ "senderBy": "customerService", "content": "Can you clarify?" }));
}

#[tokio::test]
async fn append_message_server_error_is_failure() {
    let (store, backend) = spawn_backend().await;
    let err = store
        .append_message(&ticket("closed"), &NewMessage::agent("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Status { status: 500, .. }));
    assert!(backend.posted.lock().unwrap().is_empty());
}

// =============================================================================
// ticket_url
// =============================================================================

fn store_at(base: &str) -> HttpChatStore {
    HttpChatStore::new(&ChatConfig::default().with_api_url(base).unwrap()).unwrap()
}

#[test]
fn ticket_url_escapes_reserved_characters_in_id() {
    let store = store_at("http://helpdesk.test");
    let url = store.ticket_url(&ticket("a/b c?"), "chats").unwrap();
    assert_eq!(url.as_str(), "http://helpdesk.test/api/tickets/a%2Fb%20c%3F/chats");
}

#[test]
fn ticket_url_keeps_base_path_prefix() {
    let store = store_at("https://helpdesk.test/support/");
    let url = store.ticket_url(&ticket("42"), "messages").unwrap();
    assert_eq!(url.as_str(), "https://helpdesk.test/support/api/tickets/42/messages");
}
