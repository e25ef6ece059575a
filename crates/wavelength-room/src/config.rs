//! Room configuration: the rules every room is created with.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Configuration for a room instance.
///
/// `Default` gives the standard game rules. The registry hands a clone to
/// every room it creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum players required to start (or restart) a game.
    pub min_players: usize,

    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// Rounds per game.
    pub total_rounds: u32,

    /// Integer values the secret target is sampled from, inclusive.
    pub target_range: RangeInclusive<u32>,

    /// Where every guesser's dial starts, and the average when there are
    /// no guessers.
    pub dial_center: f64,

    /// Capacity of the room actor's command queue. A full queue makes
    /// senders wait.
    pub command_channel_size: usize,

    /// Seed for room codes, targets and deck order. Each room mixes its own
    /// code into it. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 10,
            total_rounds: 10,
            target_range: 10..=90,
            dial_center: 50.0,
            command_channel_size: 64,
            seed: None,
        }
    }
}
