//! Peer synchronization: players, wire protocol, persistence, and the
//! client driver.

pub mod client;
pub mod player;
pub mod protocol;
pub mod storage;

pub use client::{EndReason, GameClient, SessionError, SessionPhase, SquareState};
pub use player::{GameId, GameSession, Player, PlayerId, SessionStatus};
pub use protocol::{ClientEvent, MovePayload, ServerEvent, Signal};
pub use storage::{KeyValueStore, MemoryStore, GAME_SESSION_KEY, PLAYER_KEY};
