//! Error types for the session layer.

use wavelength_protocol::{PlayerId, RoomCode};
use wavelength_transport::ConnectionId;

/// Errors that can occur while maintaining the session directory.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session is open for this connection. It either never opened or
    /// has already been closed by a disconnect.
    #[error("no session for connection {0}")]
    NotFound(ConnectionId),

    /// A session is already open for this connection.
    #[error("session already open for connection {0}")]
    AlreadyOpen(ConnectionId),

    /// The connection already belongs to a room. A connection is a member
    /// of at most one room for its whole life.
    #[error("connection {connection} is already {player_id} in room {room_code}")]
    AlreadyInRoom {
        connection: ConnectionId,
        room_code: RoomCode,
        player_id: PlayerId,
    },
}
