//! # notationix
//!
//! A two-player real-time chess engine: move legality, execution, and
//! notation, plus the peer synchronization protocol that keeps two
//! replicas of a game converged over a relay.
//!
//! ## Design Principles
//!
//! 1. **One execution path**: Local-optimistic and remote-replicated plies
//!    go through the same `apply_ply`, so determinism is the whole
//!    consistency story. No state comparison, no reconciliation.
//!
//! 2. **Raw moves on the wire**: Only the `(from, to)` tuple and the
//!    promotion choice travel. Capture, check, checkmate, and notation are
//!    re-derived by every receiver.
//!
//! 3. **Authoritative relay**: The relay validates every ply against its
//!    own canonical replica, stamps it with a sequence number, and drops
//!    anything illegal or out of turn.
//!
//! ## Architecture
//!
//! - **Table-driven movement**: Piece movement is data (`MovePattern`),
//!   not per-role code. Pawns, castling, and en passant are the only
//!   special cases.
//!
//! - **Persistent history**: Board and move history use `im` persistent
//!   vectors, so each ply snapshots the board in O(1) and undo is a pop.
//!
//! - **Canonical coordinates**: Row 0 is black's back rank, row 7 white's.
//!   Viewer orientation is a rendering transform, never game state.
//!
//! ## Modules
//!
//! - `core`: Positions, pieces, the board, and per-client game state
//! - `rules`: Move generation, legality, check detection, ply execution,
//!   and notation
//! - `session`: Players, the wire protocol, persistence, and the
//!   client-side synchronizer
//! - `relay`: Matchmaking and the authoritative forwarding hub

pub mod core;
pub mod rules;
pub mod session;
pub mod relay;

// Re-export commonly used types
pub use crate::core::{
    Board, Color, GameState, Move, Piece, Position, PromotionState, Role, RulesError, TimeControl,
};

pub use crate::rules::{
    apply_ply, execute_move, is_checkmate, is_in_check, is_promotion_move, legal_moves,
    undo_last_ply, MoveList,
};

pub use crate::session::{
    ClientEvent, EndReason, GameClient, GameId, GameSession, KeyValueStore, MemoryStore,
    MovePayload, Player, PlayerId, ServerEvent, SessionError, SessionPhase, SessionStatus,
    SquareState,
};

pub use crate::relay::{Delivery, Relay};
