//! Core data types for the social store
//!
//! Defines the two persisted record types and their bounds:
//! - `ChatMessage`: one entry in the bounded chat log
//! - `RsvpEntry`: one attendee of an event
//!
//! Wire and storage field names are camelCase to match the REST contract.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::{StoreError, StoreResult};

/// Maximum number of messages any store retains (oldest evicted first)
pub const MAX_LOG_LEN: usize = 50;

/// Maximum chat message length in characters
pub const MAX_TEXT_LEN: usize = 500;

/// Maximum attendee name length in characters
pub const MAX_NAME_LEN: usize = 30;

/// Maximum author name length in characters
pub const MAX_AUTHOR_LEN: usize = 50;

/// Color used when a caller has no identity to draw from
pub const DEFAULT_COLOR: &str = "#0EA5E9";

/// One entry in the chat log
///
/// Created on send, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub author: String,
    pub color: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl ChatMessage {
    /// Create a message with a fresh id and the current timestamp.
    ///
    /// Used by the local backend; in remote mode the server assigns both.
    pub fn new(text: impl Into<String>, author: impl Into<String>, color: impl Into<String>) -> Self {
        let timestamp = Utc::now().timestamp_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            id: format!("{}-{}", timestamp, &suffix[..8]),
            text: text.into(),
            author: author.into(),
            color: color.into(),
            timestamp,
        }
    }
}

/// One attendee of an event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RsvpEntry {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Ownership key; never displayed
    #[serde(default)]
    pub visitor_id: String,
}

impl RsvpEntry {
    /// Create a local-mode entry for `(event_id, visitor_id)`.
    ///
    /// The id is derived from the pair, so a repeat RSVP from the same
    /// visitor produces the same id and replaces the prior entry.
    pub fn local(
        event_id: &str,
        visitor_id: &str,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("{}-{}", event_id, visitor_id),
            name: name.into(),
            color: color.into(),
            timestamp: Utc::now().timestamp_millis(),
            visitor_id: visitor_id.to_string(),
        }
    }
}

/// Trim and bounds-check chat message text.
pub(crate) fn clean_text(text: &str) -> StoreResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StoreError::InvalidInput("message text is empty".into()));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(StoreError::InvalidInput(format!(
            "message text exceeds {} characters",
            MAX_TEXT_LEN
        )));
    }
    Ok(text.to_string())
}

/// Trim and bounds-check an attendee name.
pub(crate) fn clean_name(name: &str) -> StoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::InvalidInput("attendee name is empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::InvalidInput(format!(
            "attendee name exceeds {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

/// Bounds-check an author name (already trimmed by identity generation).
pub(crate) fn clean_author(author: &str) -> StoreResult<String> {
    let author = author.trim();
    if author.chars().count() > MAX_AUTHOR_LEN {
        return Err(StoreError::InvalidInput(format!(
            "author name exceeds {} characters",
            MAX_AUTHOR_LEN
        )));
    }
    Ok(if author.is_empty() {
        "Anonymous".to_string()
    } else {
        author.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_format() {
        let msg = ChatMessage::new("hi", "Otter", DEFAULT_COLOR);
        let (millis, suffix) = msg.id.split_once('-').unwrap();
        assert_eq!(millis, msg.timestamp.to_string());
        assert_eq!(suffix.len(), 8);
    }

    #[test]
    fn test_local_rsvp_id_is_deterministic() {
        let a = RsvpEntry::local("karaoke-nye-2025", "123-abc", "Alice", DEFAULT_COLOR);
        let b = RsvpEntry::local("karaoke-nye-2025", "123-abc", "Alicia", DEFAULT_COLOR);
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, "karaoke-nye-2025-123-abc");
    }

    #[test]
    fn test_rsvp_wire_names_are_camel_case() {
        let entry = RsvpEntry::local("x", "v-1", "Alice", DEFAULT_COLOR);
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("visitorId").is_some());
        assert!(json.get("visitor_id").is_none());
    }

    #[test]
    fn test_text_bounds() {
        assert!(clean_text("  hello  ").is_ok_and(|t| t == "hello"));
        assert!(clean_text("   ").is_err());
        assert!(clean_text(&"x".repeat(MAX_TEXT_LEN)).is_ok());
        assert!(clean_text(&"x".repeat(MAX_TEXT_LEN + 1)).is_err());
    }

    #[test]
    fn test_name_bounds() {
        assert!(clean_name("Alice").is_ok());
        assert!(clean_name("").is_err());
        assert!(clean_name(&"n".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_author_fallback() {
        assert_eq!(clean_author("").unwrap(), "Anonymous");
        assert_eq!(clean_author("Otter").unwrap(), "Otter");
        assert!(clean_author(&"a".repeat(MAX_AUTHOR_LEN + 1)).is_err());
    }
}
