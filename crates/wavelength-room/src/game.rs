//! The room state machine: membership, rounds, dials, readiness and scoring.
//!
//! [`Room`] is plain data with synchronous methods. It never touches a
//! channel; every operation returns the [`Outbound`] messages the room actor
//! must deliver, in order. Rejections return a [`RoomError`] and leave the
//! room untouched.
//!
//! ```text
//! Lobby ──start_game──→ PsychicClue ──submit_clue──→ Dial ──all ready──→ Reveal
//!                           ↑                                              │
//!                           └───────────────next_round─────────────────────┤
//!                                                                          ↓
//!                       PsychicClue ←──play_again── GameOver ←──next_round─┘
//!                                                            (no rounds left)
//! ```

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wavelength_protocol::{
    Card, Phase, Player, PlayerId, PublicState, Recipient, RoomCode, RoundScore,
    ServerEvent,
};

use crate::cards::CardSource;
use crate::{RoomConfig, RoomError, scoring};

const DEFAULT_EMOJI: &str = "😎";
const DEFAULT_COLOR: &str = "#7c3aed";

/// A message the room actor must deliver after an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// One event for the addressed members.
    Event(Recipient, ServerEvent),

    /// A `game_state` event for every member, each built for its recipient
    /// with [`Room::public_state`] at delivery time.
    Snapshot,
}

/// Display details a player supplies when creating or joining.
/// Missing or empty fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub color: Option<String>,
}

/// Fields that live for exactly one round.
#[derive(Debug, Clone)]
struct Round {
    card: Card,
    target: u32,
    psychic_id: PlayerId,
    clue: String,
    /// One entry per guesser at round start. The psychic never has one.
    dials: BTreeMap<PlayerId, f64>,
    ready: BTreeSet<PlayerId>,
    average: f64,
}

/// One game room.
pub struct Room {
    code: RoomCode,
    config: RoomConfig,
    host_id: Option<PlayerId>,
    /// Members in join order. Psychic rotation and host promotion follow it.
    players: Vec<Player>,
    phase: Phase,
    current_round: u32,
    psychic_index: usize,
    round: Option<Round>,
    scores: Vec<RoundScore>,
    total_score: u32,
    games_started: u64,
    /// Per-room seed derived from `config.seed` and the room code.
    seed: Option<u64>,
    cards: Box<dyn CardSource>,
    rng: StdRng,
    /// Set once the last member leaves. A closed room accepts nobody.
    closed: bool,
}

/// Mixes the room code into a configured seed.
fn room_seed(seed: u64, code: &RoomCode) -> u64 {
    code.as_str()
        .bytes()
        .fold(seed, |acc, b| acc.rotate_left(8) ^ u64::from(b))
}

impl Room {
    /// Creates an empty room in the lobby.
    ///
    /// The first player to [`join`](Self::join) becomes the host.
    ///
    /// With `config.seed` set, targets and deck order are reproducible per
    /// room code; rooms with different codes still play different games.
    pub fn new(code: RoomCode, config: RoomConfig, cards: Box<dyn CardSource>) -> Self {
        let seed = config.seed.map(|seed| room_seed(seed, &code));
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            code,
            config,
            host_id: None,
            players: Vec::new(),
            phase: Phase::Lobby,
            current_round: 0,
            psychic_index: 0,
            round: None,
            scores: Vec::new(),
            total_score: 0,
            games_started: 0,
            seed,
            cards,
            rng,
            closed: false,
        }
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Adds a player.
    ///
    /// The first member is the room's creator: it becomes host and gets
    /// `room_created`. Later members get `room_joined` and everyone else
    /// gets `player_joined`.
    pub fn join(
        &mut self,
        player_id: PlayerId,
        profile: Profile,
    ) -> Result<Vec<Outbound>, RoomError> {
        if self.closed {
            return Err(RoomError::NotFound(self.code.clone()));
        }
        if self.contains(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, self.code.clone()));
        }
        if !self.phase.is_joinable() {
            return Err(RoomError::GameInProgress(self.code.clone()));
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::RoomFull {
                room_code: self.code.clone(),
                max: self.config.max_players,
            });
        }

        let creating = self.players.is_empty();
        if creating {
            self.host_id = Some(player_id.clone());
        }
        let player = Player {
            id: player_id.clone(),
            name: non_empty(profile.name)
                .unwrap_or_else(|| format!("Player {}", self.players.len() + 1)),
            emoji: non_empty(profile.emoji).unwrap_or_else(|| DEFAULT_EMOJI.to_string()),
            color: non_empty(profile.color).unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            is_host: creating,
        };
        self.players.push(player.clone());

        tracing::info!(
            room_code = %self.code,
            %player_id,
            name = %player.name,
            players = self.players.len(),
            "player joined"
        );

        let state = self.public_state(&player_id);
        if creating {
            return Ok(vec![Outbound::Event(
                Recipient::Player(player_id.clone()),
                ServerEvent::RoomCreated {
                    room_code: self.code.clone(),
                    player_id,
                    state,
                },
            )]);
        }

        Ok(vec![
            Outbound::Event(
                Recipient::Player(player_id.clone()),
                ServerEvent::RoomJoined {
                    room_code: self.code.clone(),
                    player_id: player_id.clone(),
                    state,
                },
            ),
            Outbound::Event(
                Recipient::AllExcept(player_id),
                ServerEvent::PlayerJoined {
                    player,
                    players: self.players.clone(),
                },
            ),
        ])
    }

    /// Removes a player, promoting a new host if needed.
    ///
    /// When the last member leaves the room closes and nothing is
    /// broadcast. Otherwise the others get `player_left`, and a dial round
    /// whose remaining guessers are all ready is revealed.
    pub fn leave(&mut self, player_id: &PlayerId) -> Result<Vec<Outbound>, RoomError> {
        let index = self
            .players
            .iter()
            .position(|p| &p.id == player_id)
            .ok_or_else(|| RoomError::NotInRoom(player_id.clone(), self.code.clone()))?;
        self.players.remove(index);

        if let Some(round) = &mut self.round {
            round.dials.remove(player_id);
            round.ready.remove(player_id);
        }

        if self.host_id.as_ref() == Some(player_id) {
            self.host_id = self.players.first().map(|p| p.id.clone());
            if let Some(next) = self.players.first_mut() {
                next.is_host = true;
                tracing::info!(room_code = %self.code, host = %next.id, "host promoted");
            }
        }

        tracing::info!(
            room_code = %self.code,
            %player_id,
            players = self.players.len(),
            "player left"
        );

        if self.players.is_empty() {
            self.closed = true;
            return Ok(Vec::new());
        }

        if self.phase == Phase::Dial {
            self.recompute_average();
        }

        let mut out = vec![Outbound::Event(
            Recipient::All,
            ServerEvent::PlayerLeft {
                player_id: player_id.clone(),
                players: self.players.clone(),
                new_host_id: self.host_id.clone(),
            },
        )];
        out.extend(self.reveal_if_all_ready());
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Game flow
    // -----------------------------------------------------------------------

    /// Host only, from the lobby: starts round 1.
    pub fn start_game(&mut self, requester: &PlayerId) -> Result<Vec<Outbound>, RoomError> {
        self.require_member(requester)?;
        self.require_phase("start_game", &[Phase::Lobby])?;
        self.require_host(requester)?;
        self.require_enough_players()?;

        self.begin_game();
        Ok(vec![Outbound::Snapshot])
    }

    /// Psychic only, in `psychic_clue`: stores the clue and opens the dial.
    pub fn submit_clue(
        &mut self,
        player_id: &PlayerId,
        clue: String,
    ) -> Result<Vec<Outbound>, RoomError> {
        self.require_member(player_id)?;
        self.require_phase("submit_clue", &[Phase::PsychicClue])?;
        let Some(round) = self.round.as_mut() else {
            return Err(self.phase_error("submit_clue"));
        };
        if &round.psychic_id != player_id {
            return Err(RoomError::WrongRole {
                player_id: player_id.clone(),
                operation: "submit_clue",
            });
        }

        round.clue = clue.clone();
        self.phase = Phase::Dial;
        tracing::debug!(room_code = %self.code, %player_id, "clue submitted");

        Ok(vec![
            Outbound::Event(Recipient::All, ServerEvent::ClueSubmitted { clue }),
            Outbound::Snapshot,
        ])
    }

    /// Guessers only, in `dial`: moves the sender's dial, clamped to
    /// `0..=100`, and publishes the new average.
    pub fn move_dial(
        &mut self,
        player_id: &PlayerId,
        position: f64,
    ) -> Result<Vec<Outbound>, RoomError> {
        self.require_member(player_id)?;
        self.require_phase("move_dial", &[Phase::Dial])?;
        self.require_guesser(player_id, "move_dial")?;

        if let Some(round) = self.round.as_mut() {
            round.dials.insert(player_id.clone(), position.clamp(0.0, 100.0));
        }
        self.recompute_average();

        Ok(vec![Outbound::Event(
            Recipient::All,
            ServerEvent::DialUpdate {
                average_dial_position: self.average_dial(),
                player_id: player_id.clone(),
            },
        )])
    }

    /// Guessers only, in `dial`: locks in the sender's guess. The last
    /// guesser to lock in triggers the reveal.
    pub fn set_ready(&mut self, player_id: &PlayerId) -> Result<Vec<Outbound>, RoomError> {
        self.require_member(player_id)?;
        self.require_phase("set_ready", &[Phase::Dial])?;
        self.require_guesser(player_id, "set_ready")?;

        let ready_count = match self.round.as_mut() {
            Some(round) => {
                round.ready.insert(player_id.clone());
                round.ready.len()
            }
            None => 0,
        };

        let mut out = vec![Outbound::Event(
            Recipient::All,
            ServerEvent::ReadyUpdate {
                ready_count,
                total_guessers: self.total_guessers(),
                player_id: player_id.clone(),
            },
        )];
        out.extend(self.reveal_if_all_ready());
        Ok(out)
    }

    /// Host only, during a round: starts the next one, or ends the game
    /// when no rounds or cards are left. A round skipped before its reveal
    /// scores nothing.
    pub fn next_round(&mut self, requester: &PlayerId) -> Result<Vec<Outbound>, RoomError> {
        self.require_member(requester)?;
        if !self.phase.is_in_round() {
            return Err(self.phase_error("next_round"));
        }
        self.require_host(requester)?;

        if self.phase != Phase::Reveal {
            tracing::info!(
                room_code = %self.code,
                round = self.current_round,
                phase = %self.phase,
                "round skipped"
            );
        }
        self.start_round();
        Ok(vec![Outbound::Snapshot])
    }

    /// Host only, after game over: starts a fresh game with the current
    /// members.
    pub fn play_again(&mut self, requester: &PlayerId) -> Result<Vec<Outbound>, RoomError> {
        self.require_member(requester)?;
        self.require_phase("play_again", &[Phase::GameOver])?;
        self.require_host(requester)?;
        self.require_enough_players()?;

        self.begin_game();
        Ok(vec![Outbound::Snapshot])
    }

    /// Relays an emoji reaction to everyone but the sender.
    pub fn emoji_reaction(&self, player_id: &PlayerId, emoji: String) -> Vec<Outbound> {
        let player_name = self
            .player(player_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Player".to_string());
        vec![Outbound::Event(
            Recipient::AllExcept(player_id.clone()),
            ServerEvent::EmojiBroadcast {
                emoji,
                player_id: player_id.clone(),
                player_name,
            },
        )]
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Builds the snapshot `viewer` is allowed to see.
    ///
    /// The target is included only for the psychic, or for everyone once
    /// the phase discloses it.
    pub fn public_state(&self, viewer: &PlayerId) -> PublicState {
        let round = self.round.as_ref();
        let is_psychic = round.is_some_and(|r| &r.psychic_id == viewer);
        let target_position = round
            .filter(|_| is_psychic || self.phase.discloses_target())
            .map(|r| r.target);

        PublicState {
            room_code: self.code.clone(),
            phase: self.phase,
            players: self.players.clone(),
            current_round: self.current_round,
            total_rounds: self.config.total_rounds,
            total_score: self.total_score,
            scores: self.scores.clone(),
            psychic_id: round.map(|r| r.psychic_id.clone()),
            is_psychic,
            current_card: round.map(|r| r.card.clone()),
            target_position,
            clue: round.map(|r| r.clue.clone()).unwrap_or_default(),
            average_dial_position: self.average_dial(),
            ready_count: round.map_or(0, |r| r.ready.len()),
            total_guessers: self.total_guessers(),
            is_ready: round.is_some_and(|r| r.ready.contains(viewer)),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn host_id(&self) -> Option<&PlayerId> {
        self.host_id.as_ref()
    }

    /// Members in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == player_id)
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.player(player_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn max_players(&self) -> usize {
        self.config.max_players
    }

    /// Returns `true` once the last member has left.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn psychic_id(&self) -> Option<&PlayerId> {
        self.round.as_ref().map(|r| &r.psychic_id)
    }

    /// The current round's secret target, unfiltered.
    pub fn target(&self) -> Option<u32> {
        self.round.as_ref().map(|r| r.target)
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.round.as_ref().map(|r| &r.card)
    }

    /// Mean of the guessers' dials, or the dial center outside a round.
    pub fn average_dial(&self) -> f64 {
        self.round
            .as_ref()
            .map_or(self.config.dial_center, |r| r.average)
    }

    /// Members other than the psychic, floored at zero.
    pub fn total_guessers(&self) -> usize {
        self.players.len().saturating_sub(1)
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn scores(&self) -> &[RoundScore] {
        &self.scores
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn begin_game(&mut self) {
        let seed = self
            .seed
            .map(|seed| seed.wrapping_add(self.games_started));
        self.games_started += 1;
        self.cards.reset(seed);
        self.current_round = 0;
        self.psychic_index = 0;
        self.scores.clear();
        self.total_score = 0;
        tracing::info!(room_code = %self.code, players = self.players.len(), "game started");
        self.start_round();
    }

    /// Advances the round counter and deals a new round. Returns `false`
    /// and moves to `GameOver` when the game has run out of rounds or
    /// cards.
    fn start_round(&mut self) -> bool {
        self.current_round += 1;
        if self.current_round > self.config.total_rounds || self.cards.is_exhausted() {
            return self.finish_game();
        }
        let Some(card) = self.cards.draw() else {
            return self.finish_game();
        };
        let Some(psychic_id) = self
            .players
            .get(self.psychic_index % self.players.len().max(1))
            .map(|p| p.id.clone())
        else {
            return self.finish_game();
        };
        self.psychic_index += 1;

        let target = self.rng.random_range(self.config.target_range.clone());
        let dials = self
            .players
            .iter()
            .filter(|p| p.id != psychic_id)
            .map(|p| (p.id.clone(), self.config.dial_center))
            .collect();

        tracing::info!(
            room_code = %self.code,
            round = self.current_round,
            psychic = %psychic_id,
            "round started"
        );

        self.round = Some(Round {
            card,
            target,
            psychic_id,
            clue: String::new(),
            dials,
            ready: BTreeSet::new(),
            average: self.config.dial_center,
        });
        self.phase = Phase::PsychicClue;
        true
    }

    fn finish_game(&mut self) -> bool {
        self.phase = Phase::GameOver;
        tracing::info!(
            room_code = %self.code,
            total_score = self.total_score,
            rounds = self.scores.len(),
            "game over"
        );
        false
    }

    fn recompute_average(&mut self) {
        let center = self.config.dial_center;
        if let Some(round) = self.round.as_mut() {
            round.average = scoring::average(round.dials.values().copied(), center);
        }
    }

    /// The single reveal trigger, shared by `set_ready` and `leave`.
    ///
    /// Fires in `dial` when at least one guesser remains and every guesser
    /// is ready.
    fn reveal_if_all_ready(&mut self) -> Vec<Outbound> {
        if self.phase != Phase::Dial {
            return Vec::new();
        }
        let guessers = self.total_guessers();
        let ready = self.round.as_ref().map_or(0, |r| r.ready.len());
        if guessers == 0 || ready < guessers {
            return Vec::new();
        }
        self.reveal()
    }

    fn reveal(&mut self) -> Vec<Outbound> {
        let Some(round) = self.round.as_ref() else {
            return Vec::new();
        };
        let dial = round.average;
        let distance = scoring::distance(dial, round.target);
        let points = scoring::points_for(distance);
        let psychic_name = self
            .player(&round.psychic_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let target = round.target;
        self.scores.push(RoundScore {
            round: self.current_round,
            card: round.card.clone(),
            clue: round.clue.clone(),
            target,
            dial,
            distance,
            points,
            psychic_name,
        });
        self.total_score += points;
        self.phase = Phase::Reveal;

        tracing::info!(
            room_code = %self.code,
            round = self.current_round,
            target_position = target,
            dial,
            points,
            total_score = self.total_score,
            "target revealed"
        );

        vec![
            Outbound::Event(
                Recipient::All,
                ServerEvent::RevealTarget {
                    points,
                    distance,
                    target,
                    dial,
                    total_score: self.total_score,
                    current_round: self.current_round,
                    total_rounds: self.config.total_rounds,
                },
            ),
            Outbound::Snapshot,
        ]
    }

    fn require_member(&self, player_id: &PlayerId) -> Result<(), RoomError> {
        if self.contains(player_id) {
            Ok(())
        } else {
            Err(RoomError::NotInRoom(player_id.clone(), self.code.clone()))
        }
    }

    fn require_phase(&self, operation: &'static str, allowed: &[Phase]) -> Result<(), RoomError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(self.phase_error(operation))
        }
    }

    fn phase_error(&self, operation: &'static str) -> RoomError {
        RoomError::InvalidPhase {
            operation,
            phase: self.phase,
        }
    }

    fn require_host(&self, player_id: &PlayerId) -> Result<(), RoomError> {
        if self.host_id.as_ref() == Some(player_id) {
            Ok(())
        } else {
            Err(RoomError::NotHost(player_id.clone()))
        }
    }

    fn require_guesser(&self, player_id: &PlayerId, operation: &'static str) -> Result<(), RoomError> {
        if self.psychic_id() == Some(player_id) {
            Err(RoomError::WrongRole {
                player_id: player_id.clone(),
                operation,
            })
        } else {
            Ok(())
        }
    }

    fn require_enough_players(&self) -> Result<(), RoomError> {
        if self.players.len() >= self.config.min_players {
            Ok(())
        } else {
            Err(RoomError::NotEnoughPlayers {
                room_code: self.code.clone(),
                min: self.config.min_players,
            })
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
