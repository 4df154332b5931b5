//! Remote-mode integration tests
//!
//! Runs the client against a mock implementation of the REST contract,
//! covering the happy paths, the read-fallback policy, the no-fallback
//! write policy, and the poller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use tripboard::feed::MessageFeed;
use tripboard::identity::Session;
use tripboard::notify::ChangeBus;
use tripboard::poll::{PollConfig, Poller};
use tripboard::store::{ChatMessage, RemoteConfig, RsvpEntry, SocialClient};

/// In-memory stand-in for the trip API
#[derive(Default)]
struct MockApi {
    messages: Vec<ChatMessage>,
    rsvps: HashMap<String, Vec<RsvpEntry>>,
    fail_reads: bool,
    fail_writes: bool,
}

type Shared = Arc<Mutex<MockApi>>;

async fn spawn_mock(state: Shared) -> String {
    let app = Router::new()
        .route("/messages", get(get_messages).post(post_message))
        .route("/rsvp/:event_id", get(get_rsvp).post(post_rsvp))
        .route("/rsvp/:event_id/:visitor_id", delete(delete_rsvp))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn get_messages(State(state): State<Shared>) -> (StatusCode, Json<Value>) {
    let api = state.lock().unwrap();
    if api.fail_reads {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "down" })),
        );
    }
    (StatusCode::OK, Json(json!({ "messages": api.messages })))
}

async fn post_message(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut api = state.lock().unwrap();
    if api.fail_writes {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "down" })),
        );
    }
    let timestamp = chrono::Utc::now().timestamp_millis();
    let message = ChatMessage {
        id: format!("{}-srv{}", timestamp, api.messages.len()),
        text: body["text"].as_str().unwrap_or_default().to_string(),
        author: body["author"].as_str().unwrap_or_default().to_string(),
        color: body["color"].as_str().unwrap_or_default().to_string(),
        timestamp,
    };
    api.messages.push(message.clone());
    (StatusCode::CREATED, Json(json!({ "message": message })))
}

async fn get_rsvp(
    State(state): State<Shared>,
    Path(event_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let api = state.lock().unwrap();
    if api.fail_reads {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "down" })),
        );
    }
    let attendees = api.rsvps.get(&event_id).cloned().unwrap_or_default();
    (StatusCode::OK, Json(json!({ "attendees": attendees })))
}

async fn post_rsvp(
    State(state): State<Shared>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut api = state.lock().unwrap();
    if api.fail_writes {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "down" })),
        );
    }
    let visitor_id = headers
        .get("x-visitor-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if visitor_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing visitor id" })),
        );
    }
    let entry = RsvpEntry {
        id: format!("{}-{}", event_id, visitor_id),
        name: body["name"].as_str().unwrap_or_default().to_string(),
        color: body["color"].as_str().unwrap_or_default().to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
        visitor_id: visitor_id.clone(),
    };
    // Upsert on (event_id, visitor_id), as the client assumes.
    let list = api.rsvps.entry(event_id).or_default();
    list.retain(|e| e.visitor_id != visitor_id);
    list.push(entry.clone());
    (StatusCode::CREATED, Json(json!({ "rsvp": entry })))
}

async fn delete_rsvp(
    State(state): State<Shared>,
    Path((event_id, visitor_id)): Path<(String, String)>,
) -> StatusCode {
    let mut api = state.lock().unwrap();
    if api.fail_writes {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    if let Some(list) = api.rsvps.get_mut(&event_id) {
        list.retain(|e| e.visitor_id != visitor_id);
    }
    StatusCode::OK
}

fn remote_client(dir: &TempDir, base_url: &str) -> SocialClient {
    let session = Session::load_or_create(dir.path());
    SocialClient::with_profile(
        Some(RemoteConfig::new(base_url)),
        dir.path(),
        Arc::new(ChangeBus::default()),
        session,
    )
}

#[tokio::test]
async fn messages_round_trip_through_the_server() {
    let state = Shared::default();
    let base = spawn_mock(Arc::clone(&state)).await;
    let dir = TempDir::new().unwrap();
    let client = remote_client(&dir, &base);

    assert!(client.is_configured());

    let posted = client
        .post_message("landing at 06:35")
        .await
        .unwrap()
        .unwrap();
    // The server assigned the id and echoed the identity.
    assert!(posted.id.contains("srv"));
    assert_eq!(posted.author, client.session().identity().display_name);

    let listed = client.list_messages().await.unwrap();
    assert_eq!(listed, vec![posted]);
}

#[tokio::test]
async fn failed_write_returns_no_result_and_touches_nothing() {
    let state = Shared::default();
    state.lock().unwrap().fail_writes = true;
    let base = spawn_mock(Arc::clone(&state)).await;
    let dir = TempDir::new().unwrap();
    let client = remote_client(&dir, &base);

    assert!(client.post_message("hello?").await.unwrap().is_none());
    assert!(client.add_rsvp("x", Some("Alice")).await.unwrap().is_none());
    assert!(!client.remove_rsvp("x").await.unwrap());

    // Nothing reached the server or leaked into the fallback store.
    assert!(state.lock().unwrap().messages.is_empty());
    assert!(client.my_rsvp_id("x").await.unwrap().is_none());
    assert!(!dir.path().join("messages.json").exists());
}

#[tokio::test]
async fn failed_reads_serve_the_local_record() {
    let state = Shared::default();
    state.lock().unwrap().fail_reads = true;
    let base = spawn_mock(Arc::clone(&state)).await;
    let dir = TempDir::new().unwrap();
    let client = remote_client(&dir, &base);

    // Same shape a local-mode client would give for an empty store.
    assert!(client.list_messages().await.unwrap().is_empty());
    assert!(client.list_attendees("x").await.unwrap().is_empty());
}

#[tokio::test]
async fn rsvp_lifecycle_against_the_server() {
    let state = Shared::default();
    let base = spawn_mock(Arc::clone(&state)).await;
    let dir = TempDir::new().unwrap();
    let client = remote_client(&dir, &base);

    let entry = client
        .add_rsvp("karaoke-nye-2025", Some("Alice"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.visitor_id, client.session().visitor_id());
    assert_eq!(
        client.my_rsvp_id("karaoke-nye-2025").await.unwrap().as_deref(),
        Some(client.session().visitor_id())
    );

    // Same visitor again: the server upserts, so still one attendee.
    client
        .add_rsvp("karaoke-nye-2025", Some("Alicia"))
        .await
        .unwrap()
        .unwrap();
    let attendees = client.list_attendees("karaoke-nye-2025").await.unwrap();
    assert_eq!(attendees.len(), 1);
    assert_eq!(attendees[0].name, "Alicia");

    assert!(client.remove_rsvp("karaoke-nye-2025").await.unwrap());
    assert!(client
        .list_attendees("karaoke-nye-2025")
        .await
        .unwrap()
        .is_empty());
    assert!(client
        .my_rsvp_id("karaoke-nye-2025")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn poller_converges_to_server_state_and_stops_on_drop() {
    let state = Shared::default();
    {
        let mut api = state.lock().unwrap();
        for i in 0..2 {
            api.messages.push(ChatMessage {
                id: format!("seed-{}", i),
                text: format!("seed message {}", i),
                author: "Heron".to_string(),
                color: "#10B981".to_string(),
                timestamp: chrono::Utc::now().timestamp_millis(),
            });
        }
    }
    let base = spawn_mock(Arc::clone(&state)).await;
    let dir = TempDir::new().unwrap();
    let client = Arc::new(remote_client(&dir, &base));

    let feed = MessageFeed::new();
    let handle = Poller::spawn(
        Arc::clone(&client),
        Some(feed.clone()),
        Vec::new(),
        PollConfig {
            messages_secs: 1,
            attendees_secs: 1,
        },
    );
    assert!(handle.is_active());

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(feed.snapshot().await.len(), 2);

    // Suspended: later server state no longer reaches the feed.
    drop(handle);
    state.lock().unwrap().messages.push(ChatMessage {
        id: "late".to_string(),
        text: "after teardown".to_string(),
        author: "Heron".to_string(),
        color: "#10B981".to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
    });
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(feed.snapshot().await.len(), 2);
}
