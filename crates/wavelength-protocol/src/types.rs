//! Identity and view types shared by every layer.
//!
//! Everything here travels on the wire, so the serde attributes pin the
//! exact JSON shape the browser client reads: camelCase field names,
//! snake_case phase names, plain strings for identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity inside a room, e.g. `p_k3x9a0qz`.
///
/// Issued per connection by the session directory. `#[serde(transparent)]`
/// keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps an already generated identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The 4-character code players type to join a room, e.g. `KQZT`.
///
/// Only characters from [`RoomCode::ALPHABET`] are valid. The alphabet
/// leaves out `I` and `O` so codes can be read aloud without confusing
/// them with `1` and `0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Characters a room code is drawn from.
    pub const ALPHABET: &'static str = "ABCDEFGHJKLMNPQRSTUVWXYZ";

    /// Number of characters in a room code.
    pub const LEN: usize = 4;

    /// Parses a code exactly as given (no trimming, no case folding).
    pub fn parse(value: &str) -> Result<Self, ProtocolError> {
        let valid = value.chars().count() == Self::LEN
            && value.chars().all(|ch| Self::ALPHABET.contains(ch));
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(ProtocolError::InvalidRoomCode(value.to_string()))
        }
    }

    /// Parses user input: surrounding whitespace is trimmed and letters
    /// are upper-cased before validation.
    pub fn normalize(input: &str) -> Result<Self, ProtocolError> {
        Self::parse(&input.trim().to_uppercase())
    }

    /// Builds a code by asking `pick(n)` for an index below `n` once per
    /// character. The result is always a valid code.
    pub fn random(mut pick: impl FnMut(usize) -> usize) -> Self {
        let alphabet = Self::ALPHABET.as_bytes();
        let code = (0..Self::LEN)
            .map(|_| char::from(alphabet[pick(alphabet.len()) % alphabet.len()]))
            .collect();
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Specifies which members of a room receive an outbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every member of the room.
    All,

    /// One specific member.
    Player(PlayerId),

    /// Every member except the given one (e.g. the sender of a reaction).
    AllExcept(PlayerId),
}

impl Recipient {
    /// Returns `true` if `player` is addressed by this recipient.
    pub fn includes(&self, player: &PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(target) => target == player,
            Self::AllExcept(excluded) => excluded != player,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The game phase of a room.
///
/// ```text
/// Lobby → PsychicClue → Dial → Reveal ─┬─→ PsychicClue (next round)
///                                      └─→ GameOver → PsychicClue (play again)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the host to start. The only phase that accepts joins.
    #[default]
    Lobby,
    /// The psychic sees the target and is writing a clue.
    PsychicClue,
    /// Guessers move their dials and lock in.
    Dial,
    /// The target is disclosed and the round is scored.
    Reveal,
    /// No more rounds; the host may start over.
    GameOver,
}

impl Phase {
    /// Returns `true` if new players may join.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` if the target is public in this phase.
    pub fn discloses_target(self) -> bool {
        matches!(self, Self::Reveal | Self::GameOver)
    }

    /// Returns `true` while a round is being played or reviewed.
    pub fn is_in_round(self) -> bool {
        matches!(self, Self::PsychicClue | Self::Dial | Self::Reveal)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "lobby",
            Self::PsychicClue => "psychic_clue",
            Self::Dial => "dial",
            Self::Reveal => "reveal",
            Self::GameOver => "game_over",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

/// A spectrum card: the two labels at either end of the dial.
///
/// Serialized as a two-element array, `["Hot", "Cold"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card(pub String, pub String);

impl Card {
    /// Creates a card from its left and right labels.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self(left.into(), right.into())
    }
}

/// A member of a room as every client sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub emoji: String,
    pub color: String,
    pub is_host: bool,
}

/// The outcome of one completed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundScore {
    pub round: u32,
    pub card: Card,
    pub clue: String,
    pub target: u32,
    pub dial: f64,
    pub distance: f64,
    pub points: u32,
    pub psychic_name: String,
}

/// A role-filtered snapshot of a room, built for one recipient.
///
/// `target_position` is `None` unless the recipient is the psychic or the
/// phase discloses the target. `is_psychic` and `is_ready` describe the
/// recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicState {
    pub room_code: RoomCode,
    pub phase: Phase,
    pub players: Vec<Player>,
    pub current_round: u32,
    pub total_rounds: u32,
    pub total_score: u32,
    pub scores: Vec<RoundScore>,
    pub psychic_id: Option<PlayerId>,
    pub is_psychic: bool,
    pub current_card: Option<Card>,
    pub target_position: Option<u32>,
    pub clue: String,
    pub average_dial_position: f64,
    pub ready_count: usize,
    pub total_guessers: usize,
    pub is_ready: bool,
}
