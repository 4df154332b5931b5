//! Dual-mode persistence client
//!
//! One uniform operation surface over two backends. The mode is chosen
//! once, at construction, from whether a remote base URL is configured;
//! callers cannot tell the modes apart by the shapes, ordering, or
//! bounds of what they get back.
//!
//! Failure policy:
//! - **Reads** degrade: a remote failure substitutes the local record in
//!   the same call, so the panels stay usable (in a single-profile way)
//!   without a server. The substitution is an explicit policy function,
//!   not hidden control flow.
//! - **Writes** never degrade: writing locally after a remote failure
//!   would fork state invisibly across backends. A failed remote write
//!   reports "no result" and the caller keeps its input.

use std::future::Future;
use std::sync::Arc;

use crate::identity::Session;
use crate::notify::ChangeBus;

use super::error::StoreResult;
use super::local::LocalStore;
use super::remote::{RemoteConfig, RemoteStore};
use super::types::{clean_author, clean_name, clean_text, ChatMessage, RsvpEntry};

enum Backend {
    Remote(RemoteStore),
    Local,
}

/// Uniform client over the remote API and the local store
///
/// The local store is always present: in local mode it is the backend,
/// in remote mode it serves fallback reads and remembers which RSVP id
/// belongs to this profile.
pub struct SocialClient {
    backend: Backend,
    local: LocalStore,
    session: Session,
}

impl SocialClient {
    /// Build a client. `remote` present selects remote mode for the
    /// client's lifetime; absent selects local mode entirely.
    pub fn new(
        remote: Option<RemoteConfig>,
        local: LocalStore,
        session: Session,
    ) -> Self {
        let backend = match remote {
            Some(config) => {
                tracing::info!(base_url = %config.base_url, "social store in remote mode");
                Backend::Remote(RemoteStore::new(config))
            }
            None => {
                tracing::info!(dir = %local.dir().display(), "social store in local mode");
                Backend::Local
            }
        };
        Self {
            backend,
            local,
            session,
        }
    }

    /// Convenience constructor wiring the local store from a profile
    /// directory and a bus.
    pub fn with_profile(
        remote: Option<RemoteConfig>,
        dir: impl Into<std::path::PathBuf>,
        bus: Arc<ChangeBus>,
        session: Session,
    ) -> Self {
        Self::new(remote, LocalStore::new(dir, bus), session)
    }

    /// Whether the remote backend is active (the UI's cloud/local badge).
    pub fn is_configured(&self) -> bool {
        matches!(self.backend, Backend::Remote(_))
    }

    /// The session this client attributes writes to.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// List chat messages, oldest first, at most 50.
    pub async fn list_messages(&self) -> StoreResult<Vec<ChatMessage>> {
        match &self.backend {
            Backend::Remote(remote) => {
                self.read_with_fallback(
                    "messages",
                    remote.fetch_messages(),
                    self.local.list_messages(),
                )
                .await
            }
            Backend::Local => self.local.list_messages().await,
        }
    }

    /// Post a chat message attributed to the session identity.
    ///
    /// Returns `Ok(None)` when the remote write fails; the message is not
    /// queued, retried, or written locally, and the caller should keep
    /// its compose state so the user can retry.
    pub async fn post_message(&self, text: &str) -> StoreResult<Option<ChatMessage>> {
        let text = clean_text(text)?;
        let author = clean_author(&self.session.identity().display_name)?;
        let color = &self.session.identity().color;

        match &self.backend {
            Backend::Remote(remote) => {
                match remote.post_message(&text, &author, color).await {
                    Ok(message) => Ok(Some(message)),
                    Err(err) => {
                        tracing::warn!(error = %err, "remote message post failed, not confirmed");
                        Ok(None)
                    }
                }
            }
            Backend::Local => {
                let message = self
                    .local
                    .append_message(ChatMessage::new(text, author, color.clone()))
                    .await?;
                Ok(Some(message))
            }
        }
    }

    /// List an event's attendees.
    pub async fn list_attendees(&self, event_id: &str) -> StoreResult<Vec<RsvpEntry>> {
        match &self.backend {
            Backend::Remote(remote) => {
                self.read_with_fallback(
                    "attendees",
                    remote.fetch_attendees(event_id),
                    self.local.list_attendees(event_id),
                )
                .await
            }
            Backend::Local => self.local.list_attendees(event_id).await,
        }
    }

    /// RSVP to an event under the session identity (or an explicit name).
    ///
    /// At most one entry per visitor per event: local mode enforces this
    /// by construction; in remote mode the server is trusted to upsert on
    /// `(event_id, visitor_id)` - an assumption this client cannot verify.
    /// Returns `Ok(None)` when the remote write fails.
    pub async fn add_rsvp(
        &self,
        event_id: &str,
        name: Option<&str>,
    ) -> StoreResult<Option<RsvpEntry>> {
        let name = clean_name(name.unwrap_or(&self.session.identity().display_name))?;
        let color = &self.session.identity().color;
        let visitor_id = self.session.visitor_id();

        match &self.backend {
            Backend::Remote(remote) => {
                match remote.post_rsvp(event_id, visitor_id, &name, color).await {
                    Ok(entry) => {
                        self.local.remember_rsvp(event_id, visitor_id)?;
                        Ok(Some(entry))
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, event_id, "remote RSVP failed, not confirmed");
                        Ok(None)
                    }
                }
            }
            Backend::Local => {
                let entry = RsvpEntry::local(event_id, visitor_id, name, color.clone());
                let entry = self.local.upsert_rsvp(event_id, entry).await?;
                Ok(Some(entry))
            }
        }
    }

    /// Retract this profile's RSVP for an event.
    ///
    /// Returns `Ok(false)` when the remote removal fails. Removing an
    /// RSVP that does not exist is a success in local mode.
    pub async fn remove_rsvp(&self, event_id: &str) -> StoreResult<bool> {
        let visitor_id = self
            .local
            .my_rsvp_id(event_id)
            .await?
            .unwrap_or_else(|| self.session.visitor_id().to_string());

        match &self.backend {
            Backend::Remote(remote) => {
                match remote.delete_rsvp(event_id, &visitor_id).await {
                    Ok(()) => {
                        self.local.forget_rsvp(event_id)?;
                        Ok(true)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, event_id, "remote RSVP removal failed");
                        Ok(false)
                    }
                }
            }
            Backend::Local => self.local.remove_rsvp(event_id, &visitor_id).await,
        }
    }

    /// The RSVP ownership key this profile holds for an event, if any.
    pub async fn my_rsvp_id(&self, event_id: &str) -> StoreResult<Option<String>> {
        self.local.my_rsvp_id(event_id).await
    }

    /// Read fallback policy: try the remote read; on any remote-side
    /// failure serve the local record instead. Local failures (corrupt
    /// record, I/O) propagate from either path.
    async fn read_with_fallback<T>(
        &self,
        what: &str,
        remote: impl Future<Output = StoreResult<T>>,
        local: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        match remote.await {
            Ok(value) => Ok(value),
            Err(err) if err.is_remote() => {
                tracing::debug!(error = %err, what, "remote read failed, serving local record");
                local.await
            }
            Err(err) => Err(err),
        }
    }
}
