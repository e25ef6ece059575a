//! Rooms for the Wavelength server.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! game state machine, the members' outbound channels and a card source.
//!
//! # Key types
//!
//! - [`Room`]: the state machine for membership, rounds, dials, scoring
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomRegistry`]: creates/destroys rooms, unique room codes
//! - [`CardSource`]: where spectrum cards come from ([`SpectrumDeck`])
//! - [`RoomConfig`]: room settings (player limits, rounds, target range)

mod cards;
mod config;
mod error;
mod game;
mod registry;
mod room;
pub mod scoring;

pub use cards::{CardSource, SpectrumDeck};
pub use config::RoomConfig;
pub use error::RoomError;
pub use game::{Outbound, Profile, Room};
pub use registry::{CardSourceFactory, RoomRegistry};
pub use room::{OutboundReceiver, OutboundSender, RoomAction, RoomHandle, RoomInfo};
