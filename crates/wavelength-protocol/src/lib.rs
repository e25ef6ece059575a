//! Wire protocol for the Wavelength server.
//!
//! - **Types** ([`PlayerId`], [`RoomCode`], [`Phase`], [`PublicState`], …):
//!   identities and the role-filtered room snapshot.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): one tagged union per
//!   direction, one variant per message kind.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes to events and back.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent) → Router → Room
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};
pub use types::{
    Card, Phase, Player, PlayerId, PublicState, Recipient, RoomCode, RoundScore,
};
