//! # Tripboard
//!
//! Social sidebar for a personal trip site: an anonymous chat feed and a
//! per-event RSVP counter, persisted through a remote REST API or, when
//! no endpoint is configured, through a local file-backed store.
//!
//! ## Features
//!
//! - **Dual-mode persistence**: one client surface, two interchangeable
//!   backends chosen once at startup
//! - **Offline degradation**: remote read failures silently serve the
//!   local record; remote write failures report "not confirmed" and
//!   never fork state
//! - **Anonymous identity**: a stable animal name, palette color, and
//!   visitor id per profile, generated on first use
//! - **Live views**: an in-process change bus in local mode, interval
//!   polling in remote mode
//!
//! ## Modules
//!
//! - [`store`]: the dual-mode persistence client
//! - [`identity`]: per-profile session context
//! - [`notify`]: change bus for local-mode fan-out
//! - [`feed`]: in-memory views with merge rules and teardown
//! - [`poll`]: remote-mode interval refresh
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tripboard::config::Config;
//! use tripboard::identity::Session;
//! use tripboard::notify::ChangeBus;
//! use tripboard::store::SocialClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let session = Session::load_or_create(&config.storage.data_dir);
//!     let bus = Arc::new(ChangeBus::default());
//!
//!     let client = SocialClient::with_profile(
//!         config.remote_config(),
//!         &config.storage.data_dir,
//!         bus,
//!         session,
//!     );
//!
//!     client.post_message("wheels up in three days").await?;
//!     for message in client.list_messages().await? {
//!         println!("{}: {}", message.author, message.text);
//!     }
//!
//!     client.add_rsvp("karaoke-nye-2025", None).await?;
//!     println!(
//!         "{} going",
//!         client.list_attendees("karaoke-nye-2025").await?.len()
//!     );
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod feed;
pub mod identity;
pub mod notify;
pub mod poll;
pub mod store;

// Re-export top-level types for convenience
pub use store::{
    ChatMessage, RsvpEntry, SocialClient, StoreError, StoreResult, DEFAULT_COLOR, MAX_LOG_LEN,
    MAX_NAME_LEN, MAX_TEXT_LEN,
};

pub use identity::{Identity, Session};

pub use notify::{rsvp_topic, BusConfig, ChangeBus, StoreEvent, CHAT_TOPIC};

pub use feed::{AttendeeFeed, MessageFeed, WatcherHandle};

pub use poll::{PollConfig, Poller, PollerHandle};

pub use config::{generate_default_config, Config, ConfigError};
