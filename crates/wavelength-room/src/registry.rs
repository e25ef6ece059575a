//! Room registry: creates, tracks, and destroys rooms by code.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wavelength_protocol::{PlayerId, RoomCode};

use crate::cards::{CardSource, SpectrumDeck};
use crate::game::{Profile, Room};
use crate::room::spawn_room;
use crate::{OutboundSender, RoomConfig, RoomError, RoomHandle};

/// Builds a fresh card source for each new room.
pub type CardSourceFactory = Arc<dyn Fn() -> Box<dyn CardSource> + Send + Sync>;

/// Maps live room codes to their actors.
///
/// This is the entry point for room lookup from the router. At most one
/// live room exists per code; a code becomes reusable once its room is
/// destroyed.
pub struct RoomRegistry {
    /// Active rooms, keyed by code.
    rooms: HashMap<RoomCode, RoomHandle>,
    config: RoomConfig,
    card_source: CardSourceFactory,
    rng: StdRng,
}

impl RoomRegistry {
    /// Creates an empty registry whose rooms deal from [`SpectrumDeck`].
    pub fn new(config: RoomConfig) -> Self {
        Self::with_card_source(config, Arc::new(|| Box::new(SpectrumDeck::new())))
    }

    /// Creates an empty registry with a custom card source per room.
    pub fn with_card_source(config: RoomConfig, card_source: CardSourceFactory) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rooms: HashMap::new(),
            config,
            card_source,
            rng,
        }
    }

    /// Opens a new room with `host_id` as its first member and host.
    ///
    /// The room is registered only after the host is in it, so no one can
    /// join a room without a host. `room_created` has been queued on
    /// `outbound` when this returns.
    pub async fn create(
        &mut self,
        host_id: PlayerId,
        profile: Profile,
        outbound: OutboundSender,
    ) -> Result<RoomHandle, RoomError> {
        let room_code = self.generate_code();
        let room = Room::new(room_code.clone(), self.config.clone(), (self.card_source)());
        let handle = spawn_room(room, self.config.command_channel_size);

        if let Err(err) = handle.join(host_id.clone(), profile, outbound).await {
            let _ = handle.shutdown().await;
            return Err(err);
        }

        self.rooms.insert(room_code.clone(), handle.clone());
        tracing::info!(%room_code, host = %host_id, rooms = self.rooms.len(), "room created");
        Ok(handle)
    }

    /// Looks up a live room.
    pub fn get(&self, room_code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(room_code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_code.clone()))
    }

    /// Shuts a room down and forgets its code.
    pub async fn destroy(&mut self, room_code: &RoomCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(room_code)
            .ok_or_else(|| RoomError::NotFound(room_code.clone()))?;

        let _ = handle.shutdown().await;

        tracing::info!(%room_code, rooms = self.rooms.len(), "room destroyed");
        Ok(())
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all live room codes.
    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }

    /// Draws random codes until one is not in use.
    fn generate_code(&mut self) -> RoomCode {
        loop {
            let rng = &mut self.rng;
            let code = RoomCode::random(|n| rng.random_range(0..n));
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
