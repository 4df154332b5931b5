//! Dual-mode social store
//!
//! The persistence core: one operation surface (list/post messages,
//! list/add/remove RSVPs) over two interchangeable backends.
//!
//! - [`client`]: mode selection and the uniform operations
//! - [`remote`]: the REST API backend
//! - [`local`]: the file-backed backend (and remote mode's fallback)
//! - [`types`]: persisted record types and their bounds

mod client;
mod error;
mod local;
mod remote;
mod types;

pub use client::SocialClient;
pub use error::{StoreError, StoreResult};
pub use local::{LocalStore, MESSAGES_KEY};
pub use remote::{RemoteConfig, RemoteStore, VISITOR_ID_HEADER};
pub use types::{
    ChatMessage, RsvpEntry, DEFAULT_COLOR, MAX_AUTHOR_LEN, MAX_LOG_LEN, MAX_NAME_LEN,
    MAX_TEXT_LEN,
};
