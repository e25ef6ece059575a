//! State shared by every connection task.

use wavelength_protocol::JsonCodec;
use wavelength_room::{CardSourceFactory, RoomConfig, RoomRegistry};
use wavelength_session::{SessionConfig, SessionDirectory};
use tokio::sync::Mutex;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The two
/// locks are never held at the same time, and neither is held while
/// waiting on a room, except by [`RoomRegistry::create`] which must
/// register the room it just filled.
pub struct ServerContext {
    pub(crate) sessions: Mutex<SessionDirectory>,
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
}

impl ServerContext {
    pub fn new(
        room_config: RoomConfig,
        session_config: SessionConfig,
        card_source: Option<CardSourceFactory>,
    ) -> Self {
        let rooms = match card_source {
            Some(factory) => RoomRegistry::with_card_source(room_config, factory),
            None => RoomRegistry::new(room_config),
        };
        Self {
            sessions: Mutex::new(SessionDirectory::new(session_config)),
            rooms: Mutex::new(rooms),
            codec: JsonCodec,
        }
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.room_count()
    }
}

impl Default for ServerContext {
    fn default() -> Self {
        Self::new(RoomConfig::default(), SessionConfig::default(), None)
    }
}
