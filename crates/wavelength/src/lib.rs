//! # Wavelength
//!
//! Real-time room server for the Wavelength party game.
//!
//! Players connect over WebSocket, gather in four-letter rooms and take
//! turns as the psychic while everyone else steers a shared dial toward a
//! hidden target. The server is authoritative: it deals cards, picks
//! targets, scores rounds and tells each player only what their role may
//! see.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wavelength::prelude::*;
//!
//! # async fn start() -> Result<(), WavelengthError> {
//! let config = ServerConfig::from_env()?;
//! let server = WavelengthServerBuilder::from_config(&config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod context;
mod error;
mod handler;
mod health;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use context::ServerContext;
pub use error::WavelengthError;
pub use health::{HealthReport, health_router};
pub use server::{WavelengthServer, WavelengthServerBuilder};

/// Everything needed to run and configure a server.
pub mod prelude {
    pub use crate::{
        ConfigError, ServerConfig, ServerContext, WavelengthError, WavelengthServer,
        WavelengthServerBuilder,
    };
    pub use wavelength_protocol::{
        Card, ClientEvent, Codec, JsonCodec, Phase, Player, PlayerId, PublicState,
        RoomCode, ServerEvent,
    };
    pub use wavelength_room::{
        CardSource, CardSourceFactory, RoomConfig, RoomError, SpectrumDeck,
    };
    pub use wavelength_session::SessionConfig;
}
