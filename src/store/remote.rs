//! Remote persistence backend
//!
//! HTTP client for the trip site's REST API:
//!
//! - `GET  {base}/messages`
//! - `POST {base}/messages`
//! - `GET  {base}/rsvp/{event_id}`
//! - `POST {base}/rsvp/{event_id}` (with `X-Visitor-Id` header)
//! - `DELETE {base}/rsvp/{event_id}/{visitor_id}`
//!
//! Path segments are percent-encoded. No retries and no backoff; a failed
//! call surfaces immediately and the dual-mode client decides what to do
//! with it.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{StoreError, StoreResult};
use super::types::{ChatMessage, RsvpEntry};

/// Header carrying the visitor's ownership key on RSVP writes
pub const VISITOR_ID_HEADER: &str = "X-Visitor-Id";

/// Configuration for the remote backend
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the API (e.g. "https://api.example.com/prod")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_ms: 5000,
        }
    }
}

/// REST API client for the remote store
pub struct RemoteStore {
    client: Client,
    config: RemoteConfig,
}

impl RemoteStore {
    /// Create a new remote store with the given configuration.
    pub fn new(mut config: RemoteConfig) -> Self {
        while config.base_url.ends_with('/') {
            config.base_url.pop();
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Fetch the chat log, oldest first.
    pub async fn fetch_messages(&self) -> StoreResult<Vec<ChatMessage>> {
        let url = format!("{}/messages", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        if response.status().is_success() {
            let envelope: MessagesEnvelope = response
                .json()
                .await
                .map_err(StoreError::from_transport)?;
            Ok(envelope.messages)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    /// Post a chat message; the server assigns id and timestamp.
    pub async fn post_message(
        &self,
        text: &str,
        author: &str,
        color: &str,
    ) -> StoreResult<ChatMessage> {
        let url = format!("{}/messages", self.config.base_url);
        let body = PostMessageRequest {
            text,
            author,
            color,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        if response.status().is_success() {
            let envelope: MessageEnvelope = response
                .json()
                .await
                .map_err(StoreError::from_transport)?;
            Ok(envelope.message)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    /// Fetch an event's attendee list.
    pub async fn fetch_attendees(&self, event_id: &str) -> StoreResult<Vec<RsvpEntry>> {
        let url = format!(
            "{}/rsvp/{}",
            self.config.base_url,
            urlencoding::encode(event_id)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        if response.status().is_success() {
            let envelope: AttendeesEnvelope = response
                .json()
                .await
                .map_err(StoreError::from_transport)?;
            Ok(envelope.attendees)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    /// Add an RSVP for the visitor identified by the header.
    ///
    /// The server is trusted to upsert on `(event_id, visitor_id)`; this
    /// client does not deduplicate remotely held lists.
    pub async fn post_rsvp(
        &self,
        event_id: &str,
        visitor_id: &str,
        name: &str,
        color: &str,
    ) -> StoreResult<RsvpEntry> {
        let url = format!(
            "{}/rsvp/{}",
            self.config.base_url,
            urlencoding::encode(event_id)
        );
        let body = PostRsvpRequest { name, color };

        let response = self
            .client
            .post(&url)
            .header(VISITOR_ID_HEADER, visitor_id)
            .json(&body)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        if response.status().is_success() {
            let envelope: RsvpEnvelope = response
                .json()
                .await
                .map_err(StoreError::from_transport)?;
            Ok(envelope.rsvp)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    /// Remove a visitor's RSVP.
    pub async fn delete_rsvp(&self, event_id: &str, visitor_id: &str) -> StoreResult<()> {
        let url = format!(
            "{}/rsvp/{}/{}",
            self.config.base_url,
            urlencoding::encode(event_id),
            urlencoding::encode(visitor_id)
        );

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn api_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        StoreError::Api { status, message }
    }
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    text: &'a str,
    author: &'a str,
    color: &'a str,
}

#[derive(Debug, Serialize)]
struct PostRsvpRequest<'a> {
    name: &'a str,
    color: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesEnvelope {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct AttendeesEnvelope {
    #[serde(default)]
    attendees: Vec<RsvpEntry>,
}

#[derive(Debug, Deserialize)]
struct RsvpEnvelope {
    rsvp: RsvpEntry,
}
