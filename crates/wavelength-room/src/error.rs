//! Error types for the room layer.

use wavelength_protocol::{Phase, PlayerId, RoomCode};

/// Errors that can occur during room operations.
///
/// Every variant is a rejected operation: the room is left unchanged.
/// Only some rejections are worth telling the player about; see
/// [`is_user_facing`](Self::is_user_facing).
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code, or it has just emptied.
    #[error("Room not found")]
    NotFound(RoomCode),

    /// The requested code cannot name any room.
    #[error("Room not found")]
    UnknownCode(String),

    /// The room has left the lobby and no longer accepts joins.
    #[error("Game already in progress")]
    GameInProgress(RoomCode),

    /// The room is at capacity.
    #[error("Room is full (max {max} players)")]
    RoomFull { room_code: RoomCode, max: usize },

    /// Too few members to start or restart a game.
    #[error("Need at least {min} players")]
    NotEnoughPlayers { room_code: RoomCode, min: usize },

    /// The player is not a member of this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomCode),

    /// The player is already a member of this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomCode),

    /// A host-only operation was requested by someone else.
    #[error("player {0} is not the host")]
    NotHost(PlayerId),

    /// The operation belongs to the psychic and the sender is not it,
    /// or the other way around.
    #[error("player {player_id} has the wrong role for {operation}")]
    WrongRole {
        player_id: PlayerId,
        operation: &'static str,
    },

    /// The operation is not legal in the room's current phase.
    #[error("{operation} is not allowed in phase {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },

    /// The room actor has stopped or its command queue is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// Returns `true` if the player should receive an `error` event with
    /// this message. Everything else is a race artifact or a client bug
    /// and is dropped silently.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::UnknownCode(_)
                | Self::GameInProgress(_)
                | Self::RoomFull { .. }
                | Self::NotEnoughPlayers { .. }
        )
    }
}
