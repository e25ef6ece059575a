//! Inbound and outbound event unions.
//!
//! Every frame on the wire is one JSON object with a `type` tag:
//!
//! ```json
//! { "type": "move_dial", "position": 70 }
//! { "type": "dial_update", "averageDialPosition": 60, "playerId": "p_k3x9a0qz" }
//! ```
//!
//! `#[serde(tag = "type")]` gives the internally tagged shape,
//! `rename_all = "snake_case"` names the tags and
//! `rename_all_fields = "camelCase"` names the payload fields.
//! A frame whose `type` is not listed here fails to decode and is dropped
//! by the router.

use serde::{Deserialize, Serialize};

use crate::{Player, PlayerId, PublicState, RoomCode};

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Open a new room with the sender as host.
    CreateRoom {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        emoji: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },

    /// Join an existing room by code. The code is normalized server-side.
    JoinRoom {
        #[serde(default)]
        room_code: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        emoji: Option<String>,
        #[serde(default)]
        color: Option<String>,
    },

    /// Host only: leave the lobby and start round 1.
    StartGame,

    /// Psychic only: submit the clue for this round.
    SubmitClue {
        #[serde(default)]
        clue: String,
    },

    /// Guessers only: move the sender's dial. Clamped to 0..=100.
    MoveDial { position: f64 },

    /// Guessers only: lock in the sender's guess.
    SetReady,

    /// Host only: advance to the next round (or end the game).
    NextRound,

    /// Host only: start a fresh game after game over.
    PlayAgain,

    /// A transient reaction shown to everyone else in the room.
    EmojiReaction {
        #[serde(default)]
        emoji: String,
    },
}

impl ClientEvent {
    /// The wire tag of this event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::StartGame => "start_game",
            Self::SubmitClue { .. } => "submit_clue",
            Self::MoveDial { .. } => "move_dial",
            Self::SetReady => "set_ready",
            Self::NextRound => "next_round",
            Self::PlayAgain => "play_again",
            Self::EmojiReaction { .. } => "emoji_reaction",
        }
    }
}

/// Messages the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Sent to the creator of a room.
    RoomCreated {
        room_code: RoomCode,
        player_id: PlayerId,
        state: PublicState,
    },

    /// Sent to a player who just joined.
    RoomJoined {
        room_code: RoomCode,
        player_id: PlayerId,
        state: PublicState,
    },

    /// Sent to every other member when someone joins.
    PlayerJoined {
        player: Player,
        players: Vec<Player>,
    },

    /// Sent to the remaining members when someone disconnects.
    PlayerLeft {
        player_id: PlayerId,
        players: Vec<Player>,
        new_host_id: Option<PlayerId>,
    },

    /// A full role-filtered snapshot for the recipient.
    GameState { state: PublicState },

    /// The psychic's clue, sent when it is submitted.
    ClueSubmitted { clue: String },

    /// The room's average dial after a guesser moved.
    DialUpdate {
        average_dial_position: f64,
        player_id: PlayerId,
    },

    /// Readiness progress after a guesser locked in.
    ReadyUpdate {
        ready_count: usize,
        total_guessers: usize,
        player_id: PlayerId,
    },

    /// The round's result, sent once when the target is revealed.
    RevealTarget {
        points: u32,
        distance: f64,
        target: u32,
        dial: f64,
        total_score: u32,
        current_round: u32,
        total_rounds: u32,
    },

    /// Someone else's emoji reaction.
    EmojiBroadcast {
        emoji: String,
        player_id: PlayerId,
        player_name: String,
    },

    /// A rejection the player can act on.
    Error { message: String },
}

impl ServerEvent {
    /// Shorthand for an [`Error`](Self::Error) event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// The wire tag of this event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "room_created",
            Self::RoomJoined { .. } => "room_joined",
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerLeft { .. } => "player_left",
            Self::GameState { .. } => "game_state",
            Self::ClueSubmitted { .. } => "clue_submitted",
            Self::DialUpdate { .. } => "dial_update",
            Self::ReadyUpdate { .. } => "ready_update",
            Self::RevealTarget { .. } => "reveal_target",
            Self::EmojiBroadcast { .. } => "emoji_broadcast",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    //! JSON shape checks. The browser client matches on these exact tags
    //! and field names.

    use super::*;
    use crate::Phase;

    fn decode(json: &str) -> ClientEvent {
        serde_json::from_str(json).expect("should decode")
    }

    fn sample_state() -> PublicState {
        PublicState {
            room_code: RoomCode::parse("ABCD").unwrap(),
            phase: Phase::Lobby,
            players: vec![],
            current_round: 0,
            total_rounds: 10,
            total_score: 0,
            scores: vec![],
            psychic_id: None,
            is_psychic: false,
            current_card: None,
            target_position: None,
            clue: String::new(),
            average_dial_position: 50.0,
            ready_count: 0,
            total_guessers: 0,
            is_ready: false,
        }
    }

    #[test]
    fn test_decode_create_room_with_profile() {
        let event = decode(
            r##"{"type":"create_room","name":"Alice","emoji":"fox","color":"#7c3aed"}"##,
        );
        assert_eq!(
            event,
            ClientEvent::CreateRoom {
                name: Some("Alice".into()),
                emoji: Some("fox".into()),
                color: Some("#7c3aed".into()),
            }
        );
    }

    #[test]
    fn test_decode_create_room_without_profile_fields() {
        let event = decode(r#"{"type":"create_room"}"#);
        assert_eq!(
            event,
            ClientEvent::CreateRoom {
                name: None,
                emoji: None,
                color: None,
            }
        );
    }

    #[test]
    fn test_decode_join_room_reads_camel_case_code() {
        let event = decode(r#"{"type":"join_room","roomCode":"kqzt","name":"Bob"}"#);
        match event {
            ClientEvent::JoinRoom { room_code, name, .. } => {
                assert_eq!(room_code, "kqzt");
                assert_eq!(name.as_deref(), Some("Bob"));
            }
            other => panic!("expected JoinRoom, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_unit_events() {
        assert_eq!(decode(r#"{"type":"start_game"}"#), ClientEvent::StartGame);
        assert_eq!(decode(r#"{"type":"set_ready"}"#), ClientEvent::SetReady);
        assert_eq!(decode(r#"{"type":"next_round"}"#), ClientEvent::NextRound);
        assert_eq!(decode(r#"{"type":"play_again"}"#), ClientEvent::PlayAgain);
    }

    #[test]
    fn test_decode_move_dial_accepts_integer_position() {
        assert_eq!(
            decode(r#"{"type":"move_dial","position":70}"#),
            ClientEvent::MoveDial { position: 70.0 }
        );
    }

    #[test]
    fn test_decode_move_dial_without_position_fails() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type":"move_dial"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_kind_fails() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type":"fly_to_moon","speed":9000}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        assert_eq!(
            decode(r#"{"type":"submit_clue","clue":"Volcano","extra":1}"#),
            ClientEvent::SubmitClue {
                clue: "Volcano".into()
            }
        );
    }

    #[test]
    fn test_client_event_kind_matches_tag() {
        let event = ClientEvent::EmojiReaction { emoji: "fire".into() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
    }

    #[test]
    fn test_encode_room_created_shape() {
        let event = ServerEvent::RoomCreated {
            room_code: RoomCode::parse("ABCD").unwrap(),
            player_id: PlayerId::new("p_1"),
            state: sample_state(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "room_created");
        assert_eq!(json["roomCode"], "ABCD");
        assert_eq!(json["playerId"], "p_1");
        assert_eq!(json["state"]["phase"], "lobby");
        assert!(json["state"]["targetPosition"].is_null());
        assert_eq!(json["state"]["averageDialPosition"], 50.0);
    }

    #[test]
    fn test_encode_dial_update_shape() {
        let event = ServerEvent::DialUpdate {
            average_dial_position: 60.0,
            player_id: PlayerId::new("p_2"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "dial_update");
        assert_eq!(json["averageDialPosition"], 60.0);
        assert_eq!(json["playerId"], "p_2");
    }

    #[test]
    fn test_encode_player_left_without_host() {
        let event = ServerEvent::PlayerLeft {
            player_id: PlayerId::new("p_2"),
            players: vec![],
            new_host_id: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "player_left");
        assert!(json["newHostId"].is_null());
    }

    #[test]
    fn test_encode_reveal_target_shape() {
        let event = ServerEvent::RevealTarget {
            points: 3,
            distance: 7.0,
            target: 67,
            dial: 60.0,
            total_score: 3,
            current_round: 1,
            total_rounds: 10,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "reveal_target");
        assert_eq!(json["totalScore"], 3);
        assert_eq!(json["currentRound"], 1);
        assert_eq!(json["totalRounds"], 10);
        assert_eq!(event.kind(), "reveal_target");
    }

    #[test]
    fn test_encode_error_shape() {
        let json = serde_json::to_value(ServerEvent::error("Room not found")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "error", "message": "Room not found"}));
    }
}
