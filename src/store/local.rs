//! Local persistence backend
//!
//! A file-backed key/record store under the profile's data directory:
//! one JSON file per logical key, whole-record read-modify-write, no
//! locking (last write wins across concurrent writers). The chat log is
//! bounded to the newest [`MAX_LOG_LEN`] entries; RSVP lists hold at most
//! one entry per visitor.
//!
//! Every write publishes on the change bus so other live views of the
//! same process observe the update without polling.
//!
//! Record keys:
//! - `messages` - the chat log
//! - `rsvp-<event_id>` - attendees of one event
//! - `rsvp-<event_id>-my-id` - this profile's remembered RSVP ownership key
//!
//! File names are percent-encoded from the key, so arbitrary event ids
//! cannot escape the data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::notify::{rsvp_topic, ChangeBus, StoreEvent, CHAT_TOPIC};

use super::error::{StoreError, StoreResult};
use super::types::{ChatMessage, RsvpEntry, MAX_LOG_LEN};

/// Record key of the chat log
pub const MESSAGES_KEY: &str = "messages";

fn rsvp_key(event_id: &str) -> String {
    format!("rsvp-{}", event_id)
}

fn my_id_key(event_id: &str) -> String {
    format!("rsvp-{}-my-id", event_id)
}

/// File-backed store for one profile directory
pub struct LocalStore {
    dir: PathBuf,
    bus: Arc<ChangeBus>,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>, bus: Arc<ChangeBus>) -> Self {
        Self {
            dir: dir.into(),
            bus,
        }
    }

    /// The profile directory this store writes under.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the chat log, oldest first. Missing record reads as empty.
    pub async fn list_messages(&self) -> StoreResult<Vec<ChatMessage>> {
        Ok(self.read_record(MESSAGES_KEY)?.unwrap_or_default())
    }

    /// Append a message, truncate to the newest [`MAX_LOG_LEN`], persist,
    /// and publish to the chat topic.
    pub async fn append_message(&self, message: ChatMessage) -> StoreResult<ChatMessage> {
        let mut messages: Vec<ChatMessage> =
            self.read_record(MESSAGES_KEY)?.unwrap_or_default();
        messages.push(message.clone());
        if messages.len() > MAX_LOG_LEN {
            let excess = messages.len() - MAX_LOG_LEN;
            messages.drain(..excess);
        }
        self.write_record(MESSAGES_KEY, &messages)?;

        self.bus
            .publish(CHAT_TOPIC, StoreEvent::MessagePosted(message.clone()));
        tracing::debug!(id = %message.id, "appended chat message");
        Ok(message)
    }

    /// Read an event's attendee list. Missing record reads as empty.
    pub async fn list_attendees(&self, event_id: &str) -> StoreResult<Vec<RsvpEntry>> {
        Ok(self.read_record(&rsvp_key(event_id))?.unwrap_or_default())
    }

    /// Replace any prior entry by the same visitor, append the new one,
    /// remember the visitor's ownership key for the event, and publish
    /// the full post-write list.
    pub async fn upsert_rsvp(&self, event_id: &str, entry: RsvpEntry) -> StoreResult<RsvpEntry> {
        let key = rsvp_key(event_id);
        let mut attendees: Vec<RsvpEntry> = self.read_record(&key)?.unwrap_or_default();
        attendees.retain(|a| a.visitor_id != entry.visitor_id);
        attendees.push(entry.clone());
        self.write_record(&key, &attendees)?;
        self.write_record(&my_id_key(event_id), &entry.visitor_id)?;

        self.bus.publish(
            &rsvp_topic(event_id),
            StoreEvent::AttendeesChanged {
                event_id: event_id.to_string(),
                attendees,
            },
        );
        tracing::debug!(event_id, visitor_id = %entry.visitor_id, "upserted RSVP");
        Ok(entry)
    }

    /// Remove a visitor's entry for an event, forget the ownership key,
    /// and publish the remaining list. Removing a visitor with no entry
    /// is a no-op that still reports success (idempotent delete).
    pub async fn remove_rsvp(&self, event_id: &str, visitor_id: &str) -> StoreResult<bool> {
        let key = rsvp_key(event_id);
        let mut attendees: Vec<RsvpEntry> = self.read_record(&key)?.unwrap_or_default();
        attendees.retain(|a| a.visitor_id != visitor_id);
        self.write_record(&key, &attendees)?;
        self.remove_record(&my_id_key(event_id))?;

        self.bus.publish(
            &rsvp_topic(event_id),
            StoreEvent::AttendeesChanged {
                event_id: event_id.to_string(),
                attendees,
            },
        );
        tracing::debug!(event_id, visitor_id, "removed RSVP");
        Ok(true)
    }

    /// The remembered ownership key for an event, if this profile has a
    /// live (or remotely confirmed) RSVP there.
    pub async fn my_rsvp_id(&self, event_id: &str) -> StoreResult<Option<String>> {
        self.read_record(&my_id_key(event_id))
    }

    /// Remember the ownership key after a remotely confirmed RSVP.
    pub(crate) fn remember_rsvp(&self, event_id: &str, visitor_id: &str) -> StoreResult<()> {
        self.write_record(&my_id_key(event_id), &visitor_id)
    }

    /// Forget the ownership key after a remotely confirmed removal.
    pub(crate) fn forget_rsvp(&self, event_id: &str) -> StoreResult<()> {
        self.remove_record(&my_id_key(event_id))
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", urlencoding::encode(key)))
    }

    fn read_record<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let value = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            error: e.to_string(),
        })?;
        Ok(Some(value))
    }

    fn write_record<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string(value).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            error: e.to_string(),
        })?;
        std::fs::write(self.record_path(key), content)?;
        Ok(())
    }

    fn remove_record(&self, key: &str) -> StoreResult<()> {
        let path = self.record_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}
