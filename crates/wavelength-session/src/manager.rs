//! The session directory: one record per live connection.
//!
//! Responsibilities:
//! - Opening a session when a connection is accepted
//! - Issuing player identities that are unique among live sessions
//! - Attaching a session to a room once a create/join completes
//! - Closing the session when the connection drops
//!
//! # Concurrency note
//!
//! `SessionDirectory` is a plain `HashMap`, not a concurrent map. The
//! server context keeps it behind a single async mutex; every method here
//! is a short, non-blocking map operation.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use wavelength_protocol::{PlayerId, RoomCode};
use wavelength_transport::ConnectionId;

use crate::{Membership, Session, SessionConfig, SessionError};

/// Characters of the random part of a player id.
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Maps each live connection to its session.
///
/// ## Lifecycle
///
/// ```text
/// open() ──→ [unattached] ──attach()──→ [member of room] ──close()──→ gone
///    │                                                        ↑
///    └────────────────────────close()─────────────────────────┘
/// ```
pub struct SessionDirectory {
    /// All live sessions, keyed by connection.
    sessions: HashMap<ConnectionId, Session>,

    /// Attached player ids, kept in sync with `sessions` so issued ids
    /// stay unique.
    players: HashSet<PlayerId>,

    config: SessionConfig,
}

impl SessionDirectory {
    /// Creates an empty directory.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            players: HashSet::new(),
            config,
        }
    }

    /// Opens an unattached session for a freshly accepted connection.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyOpen`] if the connection already has one.
    pub fn open(&mut self, connection_id: ConnectionId) -> Result<&Session, SessionError> {
        if self.sessions.contains_key(&connection_id) {
            return Err(SessionError::AlreadyOpen(connection_id));
        }
        tracing::debug!(%connection_id, "session opened");
        Ok(self.sessions.entry(connection_id).or_insert(Session {
            connection_id,
            membership: None,
        }))
    }

    /// Issues a new player id that no live session is using.
    ///
    /// The id is reserved only once [`attach`](Self::attach) records it.
    pub fn issue_player_id(&self) -> PlayerId {
        let mut rng = rand::rng();
        loop {
            let suffix: String = (0..self.config.player_id_len)
                .map(|_| {
                    char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())])
                })
                .collect();
            let candidate =
                PlayerId::new(format!("{}{suffix}", self.config.player_id_prefix));
            if !self.players.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Records that a connection has become `player_id` in `room_code`.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`]: the connection has no open session
    /// - [`SessionError::AlreadyInRoom`]: the connection is already attached
    pub fn attach(
        &mut self,
        connection_id: ConnectionId,
        room_code: RoomCode,
        player_id: PlayerId,
    ) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(&connection_id)
            .ok_or(SessionError::NotFound(connection_id))?;

        if let Some(existing) = &session.membership {
            return Err(SessionError::AlreadyInRoom {
                connection: connection_id,
                room_code: existing.room_code.clone(),
                player_id: existing.player_id.clone(),
            });
        }

        tracing::debug!(%connection_id, %room_code, %player_id, "session attached");
        self.players.insert(player_id.clone());
        session.membership = Some(Membership {
            room_code,
            player_id,
        });
        Ok(())
    }

    /// Closes a connection's session and returns it.
    ///
    /// The returned record tells the router which room, if any, must drop
    /// the player.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session is open.
    pub fn close(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&connection_id)
            .ok_or(SessionError::NotFound(connection_id))?;
        if let Some(membership) = &session.membership {
            self.players.remove(&membership.player_id);
        }
        tracing::debug!(%connection_id, "session closed");
        Ok(session)
    }

    /// Looks up a connection's session.
    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Session> {
        self.sessions.get(connection_id)
    }

    /// Returns the number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session is open.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionDirectory {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================
