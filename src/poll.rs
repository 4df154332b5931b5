//! Remote-mode poller
//!
//! Remote mode has no push channel, so displayed views approximate
//! real time by re-fetching: the chat log every 5 seconds and each
//! displayed event's attendee list every 10 seconds, replacing the feed
//! contents with whatever the fetch returns.
//!
//! Dropping the handle aborts the tasks, which is how a view suspends
//! polling when it goes away. A poller built against a local-mode client
//! is inert: there is no network to poll and the change bus already
//! covers same-process updates.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::feed::{AttendeeFeed, MessageFeed};
use crate::store::SocialClient;

/// Polling intervals
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Seconds between chat log refreshes
    pub messages_secs: u64,
    /// Seconds between attendee list refreshes
    pub attendees_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            messages_secs: 5,
            attendees_secs: 10,
        }
    }
}

/// Background refresh of live feeds from the remote store
pub struct Poller;

impl Poller {
    /// Spawn refresh tasks for the given feeds.
    ///
    /// In local mode this spawns nothing and returns an empty handle.
    pub fn spawn(
        client: Arc<SocialClient>,
        messages: Option<MessageFeed>,
        attendees: Vec<AttendeeFeed>,
        config: PollConfig,
    ) -> PollerHandle {
        if !client.is_configured() {
            tracing::warn!("poller requested in local mode; nothing to poll");
            return PollerHandle { tasks: Vec::new() };
        }

        let mut tasks = Vec::new();
        let messages_secs = config.messages_secs;
        let attendees_secs = config.attendees_secs;

        if let Some(feed) = messages {
            let client = Arc::clone(&client);
            tasks.push(tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval(std::time::Duration::from_secs(messages_secs));
                // Skip the first immediate tick; the view does its own
                // initial load.
                ticker.tick().await;

                loop {
                    ticker.tick().await;
                    match client.list_messages().await {
                        Ok(list) => feed.replace(list).await,
                        Err(e) => tracing::warn!(error = %e, "message poll failed"),
                    }
                }
            }));
        }

        for feed in attendees {
            let client = Arc::clone(&client);
            tasks.push(tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval(std::time::Duration::from_secs(attendees_secs));
                ticker.tick().await;

                loop {
                    ticker.tick().await;
                    match client.list_attendees(feed.event_id()).await {
                        Ok(list) => feed.replace(list).await,
                        Err(e) => {
                            tracing::warn!(error = %e, event_id = feed.event_id(), "attendee poll failed")
                        }
                    }
                }
            }));
        }

        tracing::debug!(tasks = tasks.len(), "poller started");
        PollerHandle { tasks }
    }
}

/// Owns the poll tasks; dropping it suspends polling.
pub struct PollerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl PollerHandle {
    /// Whether any poll task is running.
    pub fn is_active(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Suspend polling now instead of at drop.
    pub fn abort(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
