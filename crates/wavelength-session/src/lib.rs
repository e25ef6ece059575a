//! Connection sessions for the Wavelength server.
//!
//! This crate answers two questions for the router:
//!
//! 1. **Who is this connection?** Player ids are issued here
//!    ([`SessionDirectory::issue_player_id`]) and recorded once a create or
//!    join completes ([`SessionDirectory::attach`]).
//! 2. **Which room must drop it on disconnect?** [`SessionDirectory::close`]
//!    hands back the session's membership.
//!
//! Delivering events is not its job: each room actor holds its members'
//! outbound queues and fans out on its own.
//!
//! # How it fits in the stack
//!
//! ```text
//! Router (above)              ← resolves a connection to its room
//!     ↕
//! Session Layer (this crate)  ← maps connections to room memberships
//!     ↕
//! Protocol / Transport (below)  ← PlayerId, RoomCode, ConnectionId
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionDirectory;
pub use session::{Membership, Session, SessionConfig};
