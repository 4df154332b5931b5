//! Anonymous identity
//!
//! Every profile gets a stable pseudonymous identity (an animal name and
//! a palette color) and an opaque visitor id. Both are generated on first
//! use, persisted in the profile directory, and never change afterwards.
//! The visitor id attributes nothing visible; it only lets a visitor
//! recognize and retract their own RSVP.
//!
//! The `Session` is constructed once at startup and handed to whichever
//! component needs it. There is no global identity state.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Name pool for generated identities. Single animal names, no adjectives.
const ANIMALS: &[&str] = &[
    "Otter", "Ibex", "Heron", "Lynx", "Marmot", "Puffin", "Gazelle", "Badger",
    "Falcon", "Dolphin", "Hedgehog", "Raven", "Fennec", "Tortoise", "Swift",
    "Mongoose", "Pelican", "Jackal", "Stork", "Chamois",
];

/// Color palette for generated identities
const PALETTE: &[&str] = &[
    "#0EA5E9", "#F59E0B", "#10B981", "#8B5CF6", "#EF4444", "#EC4899",
    "#14B8A6", "#F97316", "#6366F1", "#84CC16",
];

const IDENTITY_FILE: &str = "identity.json";
const VISITOR_ID_FILE: &str = "visitor-id.json";

/// A profile's display identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub display_name: String,
    pub color: String,
}

/// Per-profile session context: identity plus visitor id
///
/// Loading never fails: unreadable or corrupt records are regenerated,
/// and if the profile directory cannot be written the fresh values are
/// kept in memory for the life of the process.
#[derive(Debug, Clone)]
pub struct Session {
    identity: Identity,
    visitor_id: String,
    dir: PathBuf,
}

impl Session {
    /// Load the profile's identity and visitor id, creating either on
    /// first use.
    pub fn load_or_create(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();

        let identity = match read_json::<Identity>(&dir.join(IDENTITY_FILE)) {
            Some(identity) => identity,
            None => {
                let identity = generate_identity();
                write_json(&dir, IDENTITY_FILE, &identity);
                tracing::info!(name = %identity.display_name, "generated new identity");
                identity
            }
        };

        let visitor_id = match read_json::<String>(&dir.join(VISITOR_ID_FILE)) {
            Some(id) => id,
            None => {
                let id = generate_visitor_id();
                write_json(&dir, VISITOR_ID_FILE, &id);
                id
            }
        };

        Self {
            identity,
            visitor_id,
            dir,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn visitor_id(&self) -> &str {
        &self.visitor_id
    }

    /// The profile directory backing this session.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn generate_identity() -> Identity {
    let mut rng = rand::thread_rng();
    Identity {
        display_name: ANIMALS
            .choose(&mut rng)
            .copied()
            .unwrap_or("Otter")
            .to_string(),
        color: PALETTE
            .choose(&mut rng)
            .copied()
            .unwrap_or(crate::store::DEFAULT_COLOR)
            .to_string(),
    }
}

/// `<millis>-<9 lowercase base-36 chars>`
fn generate_visitor_id() -> String {
    const BASE36: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), suffix)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt identity record, regenerating");
            None
        }
    }
}

fn write_json<T: Serialize>(dir: &Path, file: &str, value: &T) {
    let result = std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(dir.join(file), serde_json::to_string(value).unwrap_or_default()));
    if let Err(e) = result {
        tracing::warn!(error = %e, "could not persist identity record, keeping it in memory");
    }
}
