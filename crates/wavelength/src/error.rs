//! Unified error type for the Wavelength server.

use wavelength_protocol::ProtocolError;
use wavelength_room::RoomError;
use wavelength_session::SessionError;
use wavelength_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WavelengthError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad room code).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unknown connection, already in a room).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, full, wrong phase).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Invalid server configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The health endpoint could not bind or stopped serving.
    #[error("health endpoint on {addr} failed: {source}")]
    Health {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use wavelength_protocol::RoomCode;
    use wavelength_transport::ConnectionId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let wrapped: WavelengthError = err.into();
        assert!(matches!(wrapped, WavelengthError::Transport(_)));
        assert!(wrapped.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidRoomCode("??".into());
        let wrapped: WavelengthError = err.into();
        assert!(matches!(wrapped, WavelengthError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::NotFound(ConnectionId::new(4));
        let wrapped: WavelengthError = err.into();
        assert!(matches!(wrapped, WavelengthError::Session(_)));
    }

    #[test]
    fn test_from_room_error_keeps_client_message() {
        let err = RoomError::NotFound(RoomCode::parse("ABCD").unwrap());
        let wrapped: WavelengthError = err.into();
        assert!(matches!(wrapped, WavelengthError::Room(_)));
        assert_eq!(wrapped.to_string(), "Room not found");
    }

    #[test]
    fn test_from_config_error() {
        let err = ConfigError::InvalidValue("PORT".into());
        let wrapped: WavelengthError = err.into();
        assert!(matches!(wrapped, WavelengthError::Config(_)));
    }
}
