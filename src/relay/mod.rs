//! The authoritative relay.
//!
//! ## Relay
//!
//! Pairs queued players into games, validates every incoming ply against
//! its own canonical `GameState` before forwarding, stamps forwarded plies
//! with a per-game sequence number, and forwards session-control signals
//! verbatim. Invalid or out-of-turn plies are dropped with a warning and
//! never reach the opponent.
//!
//! The relay is transport-agnostic: callers feed it `(player, event)`
//! pairs and ship the returned `Delivery` batch however they like, which
//! keeps it directly drivable from tests.

use std::collections::VecDeque;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::core::{Color, GameState, RulesError};
use crate::rules::{apply_ply, is_promotion_move, legal_moves, undo_last_ply};
use crate::session::player::{GameId, PlayerId, SessionStatus};
use crate::session::protocol::{ClientEvent, MovePayload, ServerEvent};

/// A relay-side participant.
#[derive(Clone, Debug)]
struct Seat {
    id: PlayerId,
    name: String,
    connected: bool,
}

/// One live game on the relay.
#[derive(Clone, Debug)]
struct RelayGame {
    white: Seat,
    black: Seat,
    /// The canonical replica every forwarded ply has been applied to.
    state: GameState,
    /// Sequence number the next forwarded ply will carry.
    seq: u32,
    status: SessionStatus,
    /// Color with an outstanding draw offer, if any.
    draw_offer_from: Option<Color>,
    /// Color with an outstanding undo request, if any.
    undo_request_from: Option<Color>,
}

impl RelayGame {
    fn seat(&self, color: Color) -> &Seat {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn seat_mut(&mut self, color: Color) -> &mut Seat {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    fn color_of(&self, player: PlayerId) -> Option<Color> {
        if self.white.id == player {
            Some(Color::White)
        } else if self.black.id == player {
            Some(Color::Black)
        } else {
            None
        }
    }
}

/// An event addressed to one client.
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub to: PlayerId,
    pub event: ServerEvent,
}

/// Matchmaking queue plus every live game.
pub struct Relay {
    queue: VecDeque<PlayerId>,
    names: FxHashMap<PlayerId, String>,
    games: FxHashMap<GameId, RelayGame>,
    by_player: FxHashMap<PlayerId, GameId>,
    rng: StdRng,
    next_name: u32,
}

impl Relay {
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// A relay with deterministic color assignment, for tests.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            queue: VecDeque::new(),
            names: FxHashMap::default(),
            games: FxHashMap::default(),
            by_player: FxHashMap::default(),
            rng,
            next_name: 0,
        }
    }

    /// Number of players awaiting a match.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of games the relay is tracking.
    #[must_use]
    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// The canonical state of the game `player` is seated in.
    #[must_use]
    pub fn game_state_for(&self, player: PlayerId) -> Option<&GameState> {
        let game_id = self.by_player.get(&player)?;
        self.games.get(game_id).map(|g| &g.state)
    }

    fn name_for(&mut self, player: PlayerId) -> String {
        if let Some(name) = self.names.get(&player) {
            return name.clone();
        }
        self.next_name += 1;
        let name = format!("Player {}", self.next_name);
        self.names.insert(player, name.clone());
        name
    }

    /// Process one client event and return the deliveries it produced.
    pub fn handle_event(
        &mut self,
        client: PlayerId,
        event: &ClientEvent,
    ) -> Result<Vec<Delivery>, RulesError> {
        match event {
            ClientEvent::JoinQueue => Ok(self.join_queue(client)),
            ClientEvent::LeaveQueue => {
                self.queue.retain(|p| *p != client);
                Ok(vec![Delivery {
                    to: client,
                    event: ServerEvent::QueueLeft,
                }])
            }
            ClientEvent::MoveMade(payload) => self.relay_move(client, payload),
            ClientEvent::Resign(_) => {
                Ok(self.finish_and_forward(client, ServerEvent::Resign, SessionStatus::Completed))
            }
            ClientEvent::DrawOffer(_) => {
                if let Some((game, color)) = self.seated_mut(client) {
                    game.draw_offer_from = Some(color);
                }
                Ok(self.forward(client, ServerEvent::DrawOffer))
            }
            ClientEvent::DrawAccepted(_) => {
                let Some((game, color)) = self.seated_mut(client) else {
                    return Ok(Vec::new());
                };
                // Acceptance is valid only against the opponent's live
                // offer; anything else is forged or stale.
                if game.draw_offer_from != Some(color.opposite()) {
                    warn!("dropping draw acceptance from {client}: no offer pending");
                    return Ok(Vec::new());
                }
                game.draw_offer_from = None;
                game.status = SessionStatus::Completed;
                Ok(self.forward(client, ServerEvent::DrawAccepted))
            }
            ClientEvent::DrawRejected(_) => {
                let Some((game, color)) = self.seated_mut(client) else {
                    return Ok(Vec::new());
                };
                if game.draw_offer_from != Some(color.opposite()) {
                    return Ok(Vec::new());
                }
                game.draw_offer_from = None;
                Ok(self.forward(client, ServerEvent::DrawRejected))
            }
            ClientEvent::UndoRequest(_) => {
                if let Some((game, color)) = self.seated_mut(client) {
                    game.undo_request_from = Some(color);
                }
                Ok(self.forward(client, ServerEvent::UndoRequest))
            }
            ClientEvent::UndoAccepted(_) => {
                let Some((game, color)) = self.seated_mut(client) else {
                    return Ok(Vec::new());
                };
                if game.undo_request_from != Some(color.opposite()) {
                    warn!("dropping undo acceptance from {client}: no request pending");
                    return Ok(Vec::new());
                }
                game.undo_request_from = None;
                undo_last_ply(&mut game.state)?;
                Ok(self.forward(client, ServerEvent::UndoAccepted))
            }
            ClientEvent::UndoRejected(_) => {
                let Some((game, color)) = self.seated_mut(client) else {
                    return Ok(Vec::new());
                };
                if game.undo_request_from != Some(color.opposite()) {
                    return Ok(Vec::new());
                }
                game.undo_request_from = None;
                Ok(self.forward(client, ServerEvent::UndoRejected))
            }
        }
    }

    fn join_queue(&mut self, client: PlayerId) -> Vec<Delivery> {
        let name = self.name_for(client);
        let mut deliveries = vec![Delivery {
            to: client,
            event: ServerEvent::QueueJoined { player_name: name },
        }];

        if !self.queue.contains(&client) {
            self.queue.push_back(client);
        }

        if self.queue.len() >= 2 {
            let first = self.queue.pop_front();
            let second = self.queue.pop_front();
            if let (Some(a), Some(b)) = (first, second) {
                deliveries.extend(self.start_game(a, b));
            }
        }
        deliveries
    }

    fn start_game(&mut self, a: PlayerId, b: PlayerId) -> Vec<Delivery> {
        let (white_id, black_id) = if self.rng.gen::<bool>() { (a, b) } else { (b, a) };
        let white = Seat {
            id: white_id,
            name: self.name_for(white_id),
            connected: true,
        };
        let black = Seat {
            id: black_id,
            name: self.name_for(black_id),
            connected: true,
        };

        let game_id = GameId::random();
        info!("pairing {} vs {} as game {game_id}", white.name, black.name);

        let deliveries = vec![
            Delivery {
                to: white_id,
                event: ServerEvent::GameStarted {
                    game_id,
                    color: Color::White,
                    opponent_id: black_id,
                    opponent_name: black.name.clone(),
                },
            },
            Delivery {
                to: black_id,
                event: ServerEvent::GameStarted {
                    game_id,
                    color: Color::Black,
                    opponent_id: white_id,
                    opponent_name: white.name.clone(),
                },
            },
        ];

        self.by_player.insert(white_id, game_id);
        self.by_player.insert(black_id, game_id);
        self.games.insert(
            game_id,
            RelayGame {
                white,
                black,
                state: GameState::new(),
                seq: 0,
                status: SessionStatus::Active,
                draw_offer_from: None,
                undo_request_from: None,
            },
        );
        deliveries
    }

    fn game_mut(&mut self, player: PlayerId) -> Option<&mut RelayGame> {
        let game_id = *self.by_player.get(&player)?;
        self.games.get_mut(&game_id)
    }

    /// The game `player` sits in, paired with their color.
    fn seated_mut(&mut self, player: PlayerId) -> Option<(&mut RelayGame, Color)> {
        let game = self.game_mut(player)?;
        let color = game.color_of(player)?;
        Some((game, color))
    }

    fn relay_move(
        &mut self,
        client: PlayerId,
        payload: &MovePayload,
    ) -> Result<Vec<Delivery>, RulesError> {
        if !payload.from.is_valid() || !payload.to.is_valid() {
            // Debug formatting: algebraic display is only defined for
            // on-board squares.
            warn!(
                "dropping move from {client}: off-board coordinates {:?} -> {:?}",
                payload.from, payload.to
            );
            return Ok(Vec::new());
        }

        let Some(game) = self.game_mut(client) else {
            warn!("dropping move from {client}: not seated in any game");
            return Ok(Vec::new());
        };
        let Some(color) = game.color_of(client) else {
            return Ok(Vec::new());
        };
        if game.status != SessionStatus::Active {
            warn!("dropping move from {client}: game is not active");
            return Ok(Vec::new());
        }
        if game.state.current_player != color {
            warn!("dropping move from {client}: not {color}'s turn");
            return Ok(Vec::new());
        }

        let Some(piece) = game.state.board.get(payload.from) else {
            warn!("dropping move from {client}: no piece at {}", payload.from);
            return Ok(Vec::new());
        };
        if piece.color != color {
            warn!("dropping move from {client}: piece at {} is not theirs", payload.from);
            return Ok(Vec::new());
        }

        let legal = legal_moves(payload.from, &game.state.board, game.state.last_move.as_ref())?;
        if !legal.contains(&payload.to) {
            warn!(
                "dropping illegal move {} -> {} from {client}",
                payload.from, payload.to
            );
            return Ok(Vec::new());
        }

        // Promotion choice is required exactly when the ply promotes, and
        // ignored otherwise.
        let promotion = if is_promotion_move(piece, payload.to) {
            match payload.promotion {
                Some(role) => Some(role),
                None => {
                    warn!("dropping promotion without a role choice from {client}");
                    return Ok(Vec::new());
                }
            }
        } else {
            None
        };

        let record = apply_ply(&mut game.state, payload.from, payload.to, promotion)?;
        let seq = game.seq;
        game.seq += 1;
        if game.state.is_checkmate {
            game.status = SessionStatus::Completed;
        }

        let opponent = game.seat(color.opposite()).id;
        let mut forwarded = MovePayload::new(payload.from, payload.to, promotion);
        forwarded.piece = Some(record.piece.glyph().to_string());
        forwarded.seq = Some(seq);

        Ok(vec![Delivery {
            to: opponent,
            event: ServerEvent::MoveMade(forwarded),
        }])
    }

    fn forward(&mut self, client: PlayerId, event: ServerEvent) -> Vec<Delivery> {
        let Some(game) = self.game_mut(client) else {
            return Vec::new();
        };
        let Some(color) = game.color_of(client) else {
            return Vec::new();
        };
        vec![Delivery {
            to: game.seat(color.opposite()).id,
            event,
        }]
    }

    fn finish_and_forward(
        &mut self,
        client: PlayerId,
        event: ServerEvent,
        status: SessionStatus,
    ) -> Vec<Delivery> {
        if let Some(game) = self.game_mut(client) {
            game.status = status;
        }
        self.forward(client, event)
    }

    /// Mark `client` disconnected and notify the opponent.
    pub fn disconnect(&mut self, client: PlayerId) -> Vec<Delivery> {
        self.queue.retain(|p| *p != client);
        let Some(game) = self.game_mut(client) else {
            return Vec::new();
        };
        let Some(color) = game.color_of(client) else {
            return Vec::new();
        };
        game.seat_mut(color).connected = false;
        let opponent = game.seat(color.opposite()).id;
        info!("{client} disconnected from their game");
        vec![Delivery {
            to: opponent,
            event: ServerEvent::OpponentDisconnected,
        }]
    }

    /// Mark `client` reconnected and resync the opponent from the
    /// canonical state.
    pub fn reconnect(&mut self, client: PlayerId) -> Vec<Delivery> {
        let Some(game) = self.game_mut(client) else {
            return Vec::new();
        };
        let Some(color) = game.color_of(client) else {
            return Vec::new();
        };
        game.seat_mut(color).connected = true;
        let opponent = game.seat(color.opposite()).id;
        let state = game.state.clone();
        let seq = game.seq;
        vec![Delivery {
            to: opponent,
            event: ServerEvent::OpponentReconnected {
                game_state: state,
                seq,
            },
        }]
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
