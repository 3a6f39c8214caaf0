//! Persisted identity and session snapshots.
//!
//! A client keeps its `Player` identity and, while a game is live, a
//! `GameSession` snapshot in a key-value store so a restart can resume as
//! the same player. The store is a trait so tests (and embedders without a
//! filesystem) can supply an in-memory one.

use log::warn;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Storage key for the local player's identity.
pub const PLAYER_KEY: &str = "chess_player";
/// Storage key for the live game session snapshot.
pub const GAME_SESSION_KEY: &str = "chess_game_session";

/// A string key-value store for small JSON documents.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// In-memory store used by tests and ephemeral clients.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Load and parse a stored document. A missing key or a document that no
/// longer parses both yield `None`; the latter is logged.
pub fn load<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("discarding unreadable stored document {key}: {err}");
            None
        }
    }
}

/// Serialize and store a document under `key`.
pub fn save<T: Serialize>(
    store: &mut impl KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), serde_json::Error> {
    let raw = serde_json::to_string(value)?;
    store.set(key, raw);
    Ok(())
}
