//! Wire events exchanged between a client and the relay.
//!
//! Events serialize as `{"event": ..., "data": ...}` JSON. A move travels
//! as the raw `(from, to)` tuple plus the promotion choice; derived facts
//! (capture, check, notation) are never transmitted. Each side re-derives
//! them by applying the ply to its own replica.

use serde::{Deserialize, Serialize};

use crate::core::{GameState, Position, Role};
use super::player::{GameId, PlayerId};

/// One ply on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    pub from: Position,
    pub to: Position,
    /// Glyph of the moved piece, informational only; receivers trust the
    /// board, not this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<PlayerId>,
    /// Relay-stamped sequence number, absent on the client -> relay leg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u32>,
}

impl MovePayload {
    /// A client-side payload for `from -> to`, before relay stamping.
    #[must_use]
    pub fn new(from: Position, to: Position, promotion: Option<Role>) -> Self {
        Self {
            from,
            to,
            piece: None,
            promotion,
            opponent_id: None,
            seq: None,
        }
    }
}

/// Addressing envelope for session-control signals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<PlayerId>,
}

impl Signal {
    #[must_use]
    pub fn to(opponent_id: Option<PlayerId>) -> Self {
        Self { opponent_id }
    }
}

/// Events a client sends to the relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinQueue,
    LeaveQueue,
    MoveMade(MovePayload),
    Resign(Signal),
    DrawOffer(Signal),
    DrawAccepted(Signal),
    DrawRejected(Signal),
    UndoRequest(Signal),
    UndoAccepted(Signal),
    UndoRejected(Signal),
}

/// Events the relay delivers to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    QueueJoined { player_name: String },
    QueueLeft,
    #[serde(rename_all = "camelCase")]
    GameStarted {
        game_id: GameId,
        color: crate::core::Color,
        opponent_id: PlayerId,
        opponent_name: String,
    },
    MoveMade(MovePayload),
    Resign,
    DrawOffer,
    DrawAccepted,
    DrawRejected,
    UndoRequest,
    UndoAccepted,
    UndoRejected,
    OpponentDisconnected,
    #[serde(rename_all = "camelCase")]
    OpponentReconnected {
        game_state: GameState,
        /// Sequence number the next relayed ply will carry.
        seq: u32,
    },
}
