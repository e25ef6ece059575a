//! Session types: the server's record of one live connection.
//!
//! A session tracks WHICH room a connection belongs to and WHO it is
//! there, once a create or join has completed.

use wavelength_protocol::{PlayerId, RoomCode};
use wavelength_transport::ConnectionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for identity issuance.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Prefix of every issued player id.
    ///
    /// Default: `"p_"`.
    pub player_id_prefix: String,

    /// Number of random base-36 characters after the prefix.
    ///
    /// Default: 8.
    pub player_id_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_id_prefix: "p_".to_string(),
            player_id_len: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// The room a connection belongs to and its identity there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_code: RoomCode,
    pub player_id: PlayerId,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single connection's session.
///
/// Opened when the connection is accepted, closed when it drops.
/// `membership` stays `None` until a create or join completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Which connection this session belongs to.
    pub connection_id: ConnectionId,

    /// Room and player identity, once attached.
    pub membership: Option<Membership>,
}

impl Session {
    /// The room this connection belongs to, if any.
    pub fn room_code(&self) -> Option<&RoomCode> {
        self.membership.as_ref().map(|m| &m.room_code)
    }

    /// The connection's identity in its room, if any.
    pub fn player_id(&self) -> Option<&PlayerId> {
        self.membership.as_ref().map(|m| &m.player_id)
    }
}
