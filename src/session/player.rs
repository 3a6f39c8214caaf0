//! Players and game sessions.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::Color;

/// Unique player identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// A fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique game identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameId(pub Uuid);

impl GameId {
    /// A fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One participant in a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: Color,
    pub is_connected: bool,
    /// Seconds on the clock. Data model only; no clock behavior.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<u32>,
}

impl Player {
    /// A connected player with a fresh identity.
    #[must_use]
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            id: PlayerId::random(),
            name: name.into(),
            color,
            is_connected: true,
            time_remaining: None,
        }
    }
}

/// Session lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Active,
    Completed,
    Abandoned,
}

/// A matched pairing of two players.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: GameId,
    pub white: Player,
    pub black: Player,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<SystemTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<SystemTime>,
}

impl GameSession {
    /// An active session starting now.
    #[must_use]
    pub fn start(id: GameId, white: Player, black: Player) -> Self {
        Self {
            id,
            white,
            black,
            status: SessionStatus::Active,
            started_at: Some(SystemTime::now()),
            ended_at: None,
        }
    }

    /// The player seated on `color`.
    #[must_use]
    pub fn player(&self, color: Color) -> &Player {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// Mutable access to the player seated on `color`.
    pub fn player_mut(&mut self, color: Color) -> &mut Player {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Mark the session finished with the given terminal status.
    pub fn finish(&mut self, status: SessionStatus) {
        self.status = status;
        self.ended_at = Some(SystemTime::now());
    }
}
