//! Live feeds
//!
//! In-memory views of the chat log and of one event's attendee list,
//! kept current either by bus events (local mode) or by the poller
//! (remote mode). These are what presentation code reads.
//!
//! Merge rules:
//! - chat: append if no entry with the same id exists, then keep the
//!   newest [`MAX_LOG_LEN`] entries
//! - attendees: replace the snapshot wholesale with the event payload
//!
//! A watcher is torn down by dropping its handle; an event or poll
//! result arriving later cannot touch the snapshot.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use crate::notify::StoreEvent;
use crate::store::{ChatMessage, RsvpEntry, MAX_LOG_LEN};

/// Bounded in-memory view of the chat log
#[derive(Clone, Default)]
pub struct MessageFeed {
    inner: Arc<RwLock<Vec<ChatMessage>>>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents, oldest first.
    pub async fn snapshot(&self) -> Vec<ChatMessage> {
        self.inner.read().await.clone()
    }

    /// Replace the whole view (initial load, poll result).
    pub async fn replace(&self, messages: Vec<ChatMessage>) {
        *self.inner.write().await = messages;
    }

    /// Merge one bus event into the view.
    pub async fn apply(&self, event: &StoreEvent) {
        if let StoreEvent::MessagePosted(message) = event {
            let mut messages = self.inner.write().await;
            if messages.iter().any(|m| m.id == message.id) {
                return;
            }
            messages.push(message.clone());
            if messages.len() > MAX_LOG_LEN {
                let excess = messages.len() - MAX_LOG_LEN;
                messages.drain(..excess);
            }
        }
    }

    /// Keep this feed current from a bus subscription until the returned
    /// handle is dropped.
    pub fn spawn_watcher(&self, rx: broadcast::Receiver<StoreEvent>) -> WatcherHandle {
        let feed = self.clone();
        WatcherHandle::new(tokio::spawn(async move {
            watch(rx, move |event| {
                let feed = feed.clone();
                async move { feed.apply(&event).await }
            })
            .await;
        }))
    }
}

/// In-memory view of one event's attendee list
#[derive(Clone)]
pub struct AttendeeFeed {
    event_id: String,
    inner: Arc<RwLock<Vec<RsvpEntry>>>,
}

impl AttendeeFeed {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub async fn snapshot(&self) -> Vec<RsvpEntry> {
        self.inner.read().await.clone()
    }

    pub async fn replace(&self, attendees: Vec<RsvpEntry>) {
        *self.inner.write().await = attendees;
    }

    /// Merge one bus event into the view. Events for other event ids are
    /// ignored.
    pub async fn apply(&self, event: &StoreEvent) {
        if let StoreEvent::AttendeesChanged {
            event_id,
            attendees,
        } = event
        {
            if event_id == &self.event_id {
                *self.inner.write().await = attendees.clone();
            }
        }
    }

    /// Keep this feed current from a bus subscription until the returned
    /// handle is dropped.
    pub fn spawn_watcher(&self, rx: broadcast::Receiver<StoreEvent>) -> WatcherHandle {
        let feed = self.clone();
        WatcherHandle::new(tokio::spawn(async move {
            watch(rx, move |event| {
                let feed = feed.clone();
                async move { feed.apply(&event).await }
            })
            .await;
        }))
    }
}

async fn watch<F, Fut>(mut rx: broadcast::Receiver<StoreEvent>, mut merge: F)
where
    F: FnMut(StoreEvent) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    loop {
        match rx.recv().await {
            Ok(event) => merge(event).await,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "feed watcher lagged behind the bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Owns a watcher task; dropping it tears the watcher down.
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl WatcherHandle {
    fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Tear the watcher down now instead of at drop.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ChangeBus, CHAT_TOPIC};
    use crate::store::DEFAULT_COLOR;
    use std::time::Duration;

    fn msg(text: &str) -> ChatMessage {
        ChatMessage::new(text, "Otter", DEFAULT_COLOR)
    }

    #[tokio::test]
    async fn test_apply_ignores_duplicate_ids() {
        let feed = MessageFeed::new();
        let message = msg("hi");

        feed.apply(&StoreEvent::MessagePosted(message.clone())).await;
        feed.apply(&StoreEvent::MessagePosted(message)).await;

        assert_eq!(feed.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_keeps_feed_bounded() {
        let feed = MessageFeed::new();
        for i in 0..MAX_LOG_LEN + 5 {
            feed.apply(&StoreEvent::MessagePosted(msg(&format!("m-{}", i))))
                .await;
        }

        let snapshot = feed.snapshot().await;
        assert_eq!(snapshot.len(), MAX_LOG_LEN);
        assert_eq!(snapshot.first().unwrap().text, "m-5");
    }

    #[tokio::test]
    async fn test_attendee_feed_replaces_wholesale() {
        let feed = AttendeeFeed::new("x");
        feed.replace(vec![RsvpEntry::local("x", "v-1", "Alice", DEFAULT_COLOR)])
            .await;

        feed.apply(&StoreEvent::AttendeesChanged {
            event_id: "x".to_string(),
            attendees: vec![RsvpEntry::local("x", "v-2", "Bob", DEFAULT_COLOR)],
        })
        .await;

        let snapshot = feed.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "Bob");
    }

    #[tokio::test]
    async fn test_attendee_feed_ignores_other_events() {
        let feed = AttendeeFeed::new("x");
        feed.apply(&StoreEvent::AttendeesChanged {
            event_id: "y".to_string(),
            attendees: vec![RsvpEntry::local("y", "v-1", "Alice", DEFAULT_COLOR)],
        })
        .await;

        assert!(feed.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_watcher_merges_bus_events() {
        let bus = ChangeBus::default();
        let feed = MessageFeed::new();
        let _watcher = feed.spawn_watcher(bus.subscribe(CHAT_TOPIC));

        bus.publish(CHAT_TOPIC, StoreEvent::MessagePosted(msg("live")));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(feed.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_watcher_stops_merging() {
        let bus = ChangeBus::default();
        let feed = MessageFeed::new();
        let watcher = feed.spawn_watcher(bus.subscribe(CHAT_TOPIC));
        drop(watcher);

        tokio::time::sleep(Duration::from_millis(10)).await;
        bus.publish(CHAT_TOPIC, StoreEvent::MessagePosted(msg("late")));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(feed.snapshot().await.is_empty());
    }
}
