//! Change Bus
//!
//! In-process pub/sub for local-mode writes. Each logical store has its
//! own topic: one for the chat log, one per event's RSVP list. Views
//! subscribe to the topics they display and merge the published events
//! into their snapshots.
//!
//! Fan-out is best-effort: a lagging receiver loses events, and events
//! published before a subscriber attaches are not replayed. Remote mode
//! does not use the bus at all; the poller covers it.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::store::{ChatMessage, RsvpEntry};

/// Topic of the chat store
pub const CHAT_TOPIC: &str = "messages";

/// Topic of an event's RSVP store
pub fn rsvp_topic(event_id: &str) -> String {
    format!("rsvp-{}", event_id)
}

/// A write observed on a local store
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A message was appended to the chat log
    MessagePosted(ChatMessage),
    /// An event's attendee list changed; carries the full post-write list
    /// because subscribers replace their snapshot wholesale
    AttendeesChanged {
        event_id: String,
        attendees: Vec<RsvpEntry>,
    },
}

/// Configuration for the change bus
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Capacity of each topic's broadcast channel
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

/// Topic-keyed broadcast bus
///
/// Channels are created lazily, on first subscribe or publish of a topic.
pub struct ChangeBus {
    topics: Mutex<HashMap<String, broadcast::Sender<StoreEvent>>>,
    config: BusConfig,
}

impl ChangeBus {
    pub fn new(config: BusConfig) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Subscribe to a topic, creating its channel if needed.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<StoreEvent> {
        self.sender(topic).subscribe()
    }

    /// Publish an event to a topic.
    ///
    /// Returns the number of receivers the event reached.
    pub fn publish(&self, topic: &str, event: StoreEvent) -> usize {
        let reached = self.sender(topic).send(event).unwrap_or(0);
        tracing::trace!(topic, reached, "published store event");
        reached
    }

    /// Number of live subscribers on a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .expect("bus lock poisoned")
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<StoreEvent> {
        let mut topics = self.topics.lock().expect("bus lock poisoned");
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.config.channel_capacity).0)
            .clone()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}
