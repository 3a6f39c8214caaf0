//! The client-side game synchronizer.
//!
//! ## GameClient
//!
//! One `GameClient` drives one player's view of a game: it owns the local
//! `GameState` replica, turns square clicks into plies, queues outgoing
//! wire events in an outbox, and folds incoming relay events back into the
//! replica. Local moves apply optimistically; remote moves go through the
//! exact same `apply_ply` path, so two replicas fed the same move tuples
//! converge without any state comparison.
//!
//! ## Invariants
//!
//! - A local ply is applied at most once and emitted at most once
//! - A remote ply is accepted only when its sequence number is the next
//!   expected one; duplicates and stale replays are dropped
//! - While a promotion is pending, no other input is accepted

use log::{debug, info, warn};
use thiserror::Error;

use crate::core::{Color, GameState, Position, PromotionState, Role, RulesError};
use crate::rules::{apply_ply, is_promotion_move, legal_moves, undo_last_ply};
use super::player::{GameSession, Player, PlayerId, SessionStatus};
use super::protocol::{ClientEvent, MovePayload, ServerEvent, Signal};
use super::storage::{load, save, KeyValueStore, GAME_SESSION_KEY, PLAYER_KEY};

/// Session-layer failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Rules(#[from] RulesError),
    #[error("storage serialization failed: {0}")]
    Storage(#[from] serde_json::Error),
}

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    Checkmate,
    Resignation,
    DrawAgreed,
    Abandoned,
}

/// Where the client is in the matchmaking/game lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Queued,
    Active,
    Terminal(EndReason),
}

/// Display facts for one square, derived on demand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SquareState {
    pub is_selected: bool,
    pub is_possible_move: bool,
    pub is_last_move: bool,
    pub is_king_in_check: bool,
    /// Whether clicking this square can start a move right now.
    pub is_playable: bool,
}

/// One player's session driver.
pub struct GameClient<S: KeyValueStore> {
    store: S,
    player: Player,
    session: Option<GameSession>,
    game: GameState,
    promotion: PromotionState,
    /// The deferred ply awaiting a promotion choice.
    pending_promotion: Option<(Position, Position)>,
    phase: SessionPhase,
    /// Sequence number the next remote ply must carry.
    expected_seq: u32,
    outbox: Vec<ClientEvent>,
    incoming_draw_offer: bool,
    incoming_undo_request: bool,
}

impl<S: KeyValueStore> GameClient<S> {
    /// Create a client over `store`, restoring a persisted identity when
    /// one exists and minting (and persisting) a fresh one otherwise.
    pub fn new(mut store: S) -> Result<Self, SessionError> {
        let player = match load::<Player>(&store, PLAYER_KEY) {
            Some(player) => {
                info!("restored player identity {} ({})", player.name, player.id);
                player
            }
            None => {
                let player = Player::new("Anonymous", Color::White);
                save(&mut store, PLAYER_KEY, &player)?;
                info!("created player identity {}", player.id);
                player
            }
        };

        Ok(Self {
            store,
            player,
            session: None,
            game: GameState::new(),
            promotion: PromotionState::idle(),
            pending_promotion: None,
            phase: SessionPhase::Idle,
            expected_seq: 0,
            outbox: Vec::new(),
            incoming_draw_offer: false,
            incoming_undo_request: false,
        })
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn promotion(&self) -> PromotionState {
        self.promotion
    }

    pub fn has_incoming_draw_offer(&self) -> bool {
        self.incoming_draw_offer
    }

    pub fn has_incoming_undo_request(&self) -> bool {
        self.incoming_undo_request
    }

    /// Take every event queued for the relay since the last drain.
    pub fn drain_outbox(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn opponent_id(&self) -> Option<PlayerId> {
        self.session
            .as_ref()
            .map(|s| s.player(self.player.color.opposite()).id)
    }

    /// Ask the relay for an opponent.
    pub fn join_queue(&mut self) {
        self.outbox.push(ClientEvent::JoinQueue);
    }

    /// Withdraw from matchmaking.
    pub fn leave_queue(&mut self) {
        self.outbox.push(ClientEvent::LeaveQueue);
    }

    /// Handle a click on `position`.
    ///
    /// Three outcomes: clicking one of the current selection's legal
    /// destinations commits the ply (or defers it into the promotion
    /// dialog), clicking one of the local player's own pieces replaces the
    /// selection, and anything else clears it. Clicks while it is not the
    /// local player's turn, the game is over, or a promotion is pending
    /// are ignored.
    pub fn select_square(&mut self, position: Position) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Active
            || self.game.is_game_over
            || self.promotion.is_promoting
        {
            return Ok(());
        }
        if self.game.current_player != self.player.color {
            debug!("ignoring click at {position}: not local player's turn");
            return Ok(());
        }

        if let Some(from) = self.game.selected_square {
            if self.game.possible_moves.contains(&position) {
                return self.commit_local_ply(from, position);
            }
        }

        match self.game.board.get(position) {
            Some(piece) if piece.color == self.player.color => {
                let moves = legal_moves(position, &self.game.board, self.game.last_move.as_ref())
                    .map_err(SessionError::Rules)?;
                self.game.select(position, moves);
            }
            _ => self.game.clear_selection(),
        }
        Ok(())
    }

    fn commit_local_ply(&mut self, from: Position, to: Position) -> Result<(), SessionError> {
        let piece = self
            .game
            .board
            .get(from)
            .ok_or(RulesError::NoPieceAt(from))?;

        if is_promotion_move(piece, to) {
            // Defer: nothing is applied or emitted until the player picks
            // a role.
            self.promotion = PromotionState::pending(to, piece);
            self.pending_promotion = Some((from, to));
            self.game.clear_selection();
            return Ok(());
        }

        self.apply_and_emit(from, to, None)
    }

    /// Resolve a pending promotion with the chosen `role`, completing the
    /// deferred ply. Ignored when no promotion is pending.
    pub fn resolve_promotion(&mut self, role: Role) -> Result<(), SessionError> {
        let Some((from, to)) = self.pending_promotion.take() else {
            return Ok(());
        };
        self.promotion = PromotionState::idle();
        self.apply_and_emit(from, to, Some(role))
    }

    fn apply_and_emit(
        &mut self,
        from: Position,
        to: Position,
        promotion: Option<Role>,
    ) -> Result<(), SessionError> {
        let record = apply_ply(&mut self.game, from, to, promotion)?;
        // The relay stamps this ply too; account for the number it
        // consumes so the opponent's reply arrives as the expected one.
        self.expected_seq += 1;

        let mut payload = MovePayload::new(from, to, promotion);
        payload.piece = Some(record.piece.glyph().to_string());
        payload.opponent_id = self.opponent_id();
        self.outbox.push(ClientEvent::MoveMade(payload));

        if self.game.is_checkmate {
            self.end_game(EndReason::Checkmate, SessionStatus::Completed);
        }
        Ok(())
    }

    /// Concede the game.
    pub fn resign(&mut self) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.outbox.push(ClientEvent::Resign(Signal::to(self.opponent_id())));
        self.end_game(EndReason::Resignation, SessionStatus::Completed);
    }

    /// Offer the opponent a draw.
    pub fn offer_draw(&mut self) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.outbox.push(ClientEvent::DrawOffer(Signal::to(self.opponent_id())));
    }

    /// Answer the opponent's pending draw offer.
    pub fn respond_draw(&mut self, accept: bool) {
        if !self.incoming_draw_offer {
            return;
        }
        self.incoming_draw_offer = false;
        let signal = Signal::to(self.opponent_id());
        if accept {
            self.outbox.push(ClientEvent::DrawAccepted(signal));
            self.end_game(EndReason::DrawAgreed, SessionStatus::Completed);
        } else {
            self.outbox.push(ClientEvent::DrawRejected(signal));
        }
    }

    /// Ask the opponent to take back the last ply.
    pub fn request_undo(&mut self) {
        if self.phase != SessionPhase::Active || self.game.move_history.is_empty() {
            return;
        }
        self.outbox.push(ClientEvent::UndoRequest(Signal::to(self.opponent_id())));
    }

    /// Answer the opponent's pending undo request. Accepting rolls the
    /// local replica back one ply before notifying the opponent.
    pub fn respond_undo(&mut self, accept: bool) -> Result<(), SessionError> {
        if !self.incoming_undo_request {
            return Ok(());
        }
        self.incoming_undo_request = false;
        let signal = Signal::to(self.opponent_id());
        if accept {
            undo_last_ply(&mut self.game)?;
            self.outbox.push(ClientEvent::UndoAccepted(signal));
        } else {
            self.outbox.push(ClientEvent::UndoRejected(signal));
        }
        Ok(())
    }

    /// Fold one relay event into the local state.
    pub fn handle_server_event(&mut self, event: ServerEvent) -> Result<(), SessionError> {
        match event {
            ServerEvent::QueueJoined { player_name } => {
                self.player.name = player_name;
                save(&mut self.store, PLAYER_KEY, &self.player)?;
                self.phase = SessionPhase::Queued;
                info!("queued as {}", self.player.name);
            }
            ServerEvent::QueueLeft => {
                self.phase = SessionPhase::Idle;
            }
            ServerEvent::GameStarted {
                game_id,
                color,
                opponent_id,
                opponent_name,
            } => {
                self.player.color = color;
                save(&mut self.store, PLAYER_KEY, &self.player)?;

                let opponent = Player {
                    id: opponent_id,
                    name: opponent_name,
                    color: color.opposite(),
                    is_connected: true,
                    time_remaining: None,
                };
                let (white, black) = match color {
                    Color::White => (self.player.clone(), opponent),
                    Color::Black => (opponent, self.player.clone()),
                };
                let session = GameSession::start(game_id, white, black);
                save(&mut self.store, GAME_SESSION_KEY, &session)?;
                info!("game {game_id} started, playing {color}");

                self.session = Some(session);
                self.game = GameState::new();
                self.promotion = PromotionState::idle();
                self.pending_promotion = None;
                self.expected_seq = 0;
                self.incoming_draw_offer = false;
                self.incoming_undo_request = false;
                self.phase = SessionPhase::Active;
            }
            ServerEvent::MoveMade(payload) => {
                if !payload.from.is_valid() || !payload.to.is_valid() {
                    // Debug formatting: algebraic display is only defined
                    // for on-board squares.
                    warn!(
                        "dropping move with off-board coordinates {:?} -> {:?}",
                        payload.from, payload.to
                    );
                    return Ok(());
                }
                if payload.seq != Some(self.expected_seq) {
                    warn!(
                        "dropping out-of-sequence move {:?} (expected {})",
                        payload.seq, self.expected_seq
                    );
                    return Ok(());
                }
                self.expected_seq += 1;
                apply_ply(&mut self.game, payload.from, payload.to, payload.promotion)?;
                if self.game.is_checkmate {
                    self.end_game(EndReason::Checkmate, SessionStatus::Completed);
                }
            }
            ServerEvent::Resign => {
                self.end_game(EndReason::Resignation, SessionStatus::Completed);
            }
            ServerEvent::DrawOffer => {
                self.incoming_draw_offer = true;
            }
            ServerEvent::DrawAccepted => {
                self.end_game(EndReason::DrawAgreed, SessionStatus::Completed);
            }
            ServerEvent::DrawRejected => {
                info!("draw offer rejected");
            }
            ServerEvent::UndoRequest => {
                self.incoming_undo_request = true;
            }
            ServerEvent::UndoAccepted => {
                undo_last_ply(&mut self.game)?;
            }
            ServerEvent::UndoRejected => {
                info!("undo request rejected");
            }
            ServerEvent::OpponentDisconnected => {
                if let Some(session) = &mut self.session {
                    session.player_mut(self.player.color.opposite()).is_connected = false;
                }
            }
            ServerEvent::OpponentReconnected { game_state, seq } => {
                // The relay's canonical state replaces the replica
                // wholesale, sequence cursor included.
                self.game = game_state;
                self.expected_seq = seq;
                if let Some(session) = &mut self.session {
                    session.player_mut(self.player.color.opposite()).is_connected = true;
                }
            }
        }
        Ok(())
    }

    fn end_game(&mut self, reason: EndReason, status: SessionStatus) {
        self.phase = SessionPhase::Terminal(reason);
        self.game.is_game_over = true;
        if let Some(session) = &mut self.session {
            session.finish(status);
        }
        self.store.remove(GAME_SESSION_KEY);
        info!("game over: {reason:?}");
    }

    /// Display facts for `position`, derived from the current state.
    #[must_use]
    pub fn square_state(&self, position: Position) -> SquareState {
        let piece = self.game.board.get(position);
        let is_possible_move = self.game.possible_moves.contains(&position);
        let our_turn =
            self.phase == SessionPhase::Active && self.game.current_player == self.player.color;

        SquareState {
            is_selected: self.game.selected_square == Some(position),
            is_possible_move,
            is_last_move: self
                .game
                .last_move
                .as_ref()
                .is_some_and(|m| m.from == position || m.to == position),
            is_king_in_check: self.game.is_check
                && piece
                    .is_some_and(|p| p.role == Role::King && p.color == self.game.current_player),
            is_playable: our_turn
                && !self.game.is_game_over
                && (is_possible_move || piece.is_some_and(|p| p.color == self.player.color)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Piece;
    use crate::session::player::GameId;
    use crate::session::storage::MemoryStore;

    fn active_client(color: Color) -> GameClient<MemoryStore> {
        let mut client = GameClient::new(MemoryStore::new()).unwrap();
        client
            .handle_server_event(ServerEvent::GameStarted {
                game_id: GameId::random(),
                color,
                opponent_id: PlayerId::random(),
                opponent_name: "Player 2".to_string(),
            })
            .unwrap();
        client
    }

    #[test]
    fn test_identity_persists_across_restarts() {
        let mut store = MemoryStore::new();
        let first_id = {
            let client = GameClient::new(store.clone()).unwrap();
            store = client.store.clone();
            client.player().id
        };
        let client = GameClient::new(store).unwrap();
        assert_eq!(client.player().id, first_id);
    }

    #[test]
    fn test_select_then_move_emits_once() {
        let mut client = active_client(Color::White);
        let from = Position::new(6, 4);
        let to = Position::new(4, 4);

        client.select_square(from).unwrap();
        assert_eq!(client.game().selected_square, Some(from));
        assert!(client.game().possible_moves.contains(&to));

        client.select_square(to).unwrap();
        assert_eq!(client.game().current_player, Color::Black);
        assert_eq!(client.game().move_history.len(), 1);

        let outbox = client.drain_outbox();
        let moves: Vec<_> = outbox
            .iter()
            .filter(|e| matches!(e, ClientEvent::MoveMade(_)))
            .collect();
        assert_eq!(moves.len(), 1);
        assert!(client.drain_outbox().is_empty());
    }

    #[test]
    fn test_clicks_ignored_off_turn() {
        let mut client = active_client(Color::Black);
        client.select_square(Position::new(6, 4)).unwrap();
        assert_eq!(client.game().selected_square, None);
        assert!(client.drain_outbox().is_empty());
    }

    #[test]
    fn test_clicking_own_piece_switches_selection() {
        let mut client = active_client(Color::White);
        client.select_square(Position::new(6, 4)).unwrap();
        client.select_square(Position::new(7, 6)).unwrap();
        assert_eq!(client.game().selected_square, Some(Position::new(7, 6)));
        assert!(client.game().possible_moves.contains(&Position::new(5, 5)));
    }

    #[test]
    fn test_clicking_elsewhere_clears_selection() {
        let mut client = active_client(Color::White);
        client.select_square(Position::new(6, 4)).unwrap();
        client.select_square(Position::new(3, 3)).unwrap();
        assert_eq!(client.game().selected_square, None);
        assert!(client.game().possible_moves.is_empty());
    }

    #[test]
    fn test_remote_move_requires_expected_seq() {
        let mut client = active_client(Color::Black);
        let mut payload = MovePayload::new(Position::new(6, 4), Position::new(4, 4), None);
        payload.seq = Some(5);

        client
            .handle_server_event(ServerEvent::MoveMade(payload.clone()))
            .unwrap();
        assert_eq!(client.game().move_history.len(), 0);

        payload.seq = Some(0);
        client
            .handle_server_event(ServerEvent::MoveMade(payload.clone()))
            .unwrap();
        assert_eq!(client.game().move_history.len(), 1);

        // A duplicate of the same stamped move is dropped.
        client
            .handle_server_event(ServerEvent::MoveMade(payload))
            .unwrap();
        assert_eq!(client.game().move_history.len(), 1);
    }

    #[test]
    fn test_local_ply_consumes_a_sequence_number() {
        let mut client = active_client(Color::White);
        client.select_square(Position::new(6, 4)).unwrap();
        client.select_square(Position::new(4, 4)).unwrap();

        // The relay stamps our e4 with seq 0, so the reply arrives as 1.
        let mut reply = MovePayload::new(Position::new(1, 4), Position::new(3, 4), None);
        reply.seq = Some(1);
        client.handle_server_event(ServerEvent::MoveMade(reply)).unwrap();
        assert_eq!(client.game().move_history.len(), 2);
        assert_eq!(client.game().current_player, Color::White);
    }

    #[test]
    fn test_off_board_move_is_ignored() {
        let mut client = active_client(Color::Black);
        let mut hostile = MovePayload::new(Position::new(9, 9), Position::new(-1, 3), None);
        hostile.seq = Some(0);
        client.handle_server_event(ServerEvent::MoveMade(hostile)).unwrap();
        assert_eq!(client.game().move_history.len(), 0);

        // The sequence cursor did not advance: the real move still lands.
        let mut real = MovePayload::new(Position::new(6, 4), Position::new(4, 4), None);
        real.seq = Some(0);
        client.handle_server_event(ServerEvent::MoveMade(real)).unwrap();
        assert_eq!(client.game().move_history.len(), 1);
    }

    #[test]
    fn test_reconnect_resync_restores_sequence_cursor() {
        let mut client = active_client(Color::Black);
        let mut canonical = GameState::new();
        apply_ply(&mut canonical, Position::new(6, 4), Position::new(4, 4), None).unwrap();

        client
            .handle_server_event(ServerEvent::OpponentReconnected {
                game_state: canonical,
                seq: 1,
            })
            .unwrap();
        assert_eq!(client.game().move_history.len(), 1);

        // The next stamped move is the one the relay will send.
        let mut next = MovePayload::new(Position::new(1, 4), Position::new(3, 4), None);
        next.seq = Some(1);
        client.handle_server_event(ServerEvent::MoveMade(next)).unwrap();
        assert_eq!(client.game().move_history.len(), 2);
    }

    #[test]
    fn test_promotion_defers_until_role_chosen() {
        let mut client = active_client(Color::White);
        client.game.board = crate::core::Board::empty();
        client.game.board.set(
            Position::new(1, 0),
            Some(Piece::new(crate::core::Role::Pawn, Color::White)),
        );
        client.game.board.set(
            Position::new(7, 4),
            Some(Piece::new(crate::core::Role::King, Color::White)),
        );
        client.game.board.set(
            Position::new(0, 7),
            Some(Piece::new(crate::core::Role::King, Color::Black)),
        );
        client.game.board_history = im::vector![client.game.board];

        client.select_square(Position::new(1, 0)).unwrap();
        client.select_square(Position::new(0, 0)).unwrap();

        // Nothing applied or emitted yet.
        assert!(client.promotion().is_promoting);
        assert_eq!(client.game().move_history.len(), 0);
        assert!(client.drain_outbox().is_empty());

        client.resolve_promotion(Role::Queen).unwrap();
        assert!(!client.promotion().is_promoting);
        assert_eq!(client.game().move_history.len(), 1);

        let outbox = client.drain_outbox();
        match &outbox[0] {
            ClientEvent::MoveMade(payload) => assert_eq!(payload.promotion, Some(Role::Queen)),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_resign_is_terminal() {
        let mut client = active_client(Color::White);
        client.resign();
        assert_eq!(client.phase(), SessionPhase::Terminal(EndReason::Resignation));
        assert!(client.game().is_game_over);
        // Further clicks do nothing.
        client.select_square(Position::new(6, 4)).unwrap();
        assert_eq!(client.game().selected_square, None);
    }

    #[test]
    fn test_draw_flow() {
        let mut client = active_client(Color::White);
        client.handle_server_event(ServerEvent::DrawOffer).unwrap();
        assert!(client.has_incoming_draw_offer());

        client.respond_draw(true);
        assert!(!client.has_incoming_draw_offer());
        assert_eq!(client.phase(), SessionPhase::Terminal(EndReason::DrawAgreed));
    }

    #[test]
    fn test_undo_acceptance_rolls_back_both_roles() {
        let mut mover = active_client(Color::White);
        mover.select_square(Position::new(6, 4)).unwrap();
        mover.select_square(Position::new(4, 4)).unwrap();
        assert_eq!(mover.game().move_history.len(), 1);

        // The opponent asked for the takeback; we accept and roll back.
        mover.handle_server_event(ServerEvent::UndoRequest).unwrap();
        mover.respond_undo(true).unwrap();
        assert_eq!(mover.game().move_history.len(), 0);

        // The requester rolls back on the acceptance notification.
        let mut requester = active_client(Color::Black);
        requester
            .handle_server_event(ServerEvent::MoveMade({
                let mut p = MovePayload::new(Position::new(6, 4), Position::new(4, 4), None);
                p.seq = Some(0);
                p
            }))
            .unwrap();
        assert_eq!(requester.game().move_history.len(), 1);
        requester.handle_server_event(ServerEvent::UndoAccepted).unwrap();
        assert_eq!(requester.game().move_history.len(), 0);
    }

    #[test]
    fn test_square_state_flags() {
        let mut client = active_client(Color::White);
        client.select_square(Position::new(6, 4)).unwrap();

        let selected = client.square_state(Position::new(6, 4));
        assert!(selected.is_selected && selected.is_playable);

        let target = client.square_state(Position::new(4, 4));
        assert!(target.is_possible_move && target.is_playable);

        let enemy = client.square_state(Position::new(1, 0));
        assert!(!enemy.is_playable);
    }
}
