//! Integration tests for the Wavelength server: a real WebSocket listener,
//! real clients, full event flow.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_tungstenite::tungstenite::Message;
use wavelength::prelude::*;
use wavelength_room::scoring;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

struct TestServer {
    addr: String,
    health_addr: String,
    ctx: Arc<ServerContext>,
}

/// Starts a server on random ports.
async fn start_server() -> TestServer {
    let server = WavelengthServer::builder()
        .bind("127.0.0.1:0")
        .health_bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server.local_addr().expect("ws addr").to_string();
    let health_addr = server.health_addr().expect("health addr").to_string();
    let ctx = server.context();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    TestServer {
        addr,
        health_addr,
        ctx,
    }
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, event: serde_json::Value) {
    ws.send(Message::text(event.to_string()))
        .await
        .expect("send");
}

/// Receives the next server event, failing after two seconds.
async fn recv(ws: &mut ClientWs) -> ServerEvent {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("ws error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("decode server event");
        }
    }
}

/// Receives events until one of the given kind arrives.
async fn recv_kind(ws: &mut ClientWs, kind: &str) -> ServerEvent {
    loop {
        let event = recv(ws).await;
        if event.kind() == kind {
            return event;
        }
    }
}

/// Creates a room and returns its code and the creator's id.
async fn create_room(ws: &mut ClientWs, name: &str) -> (RoomCode, PlayerId) {
    send(ws, json!({ "type": "create_room", "name": name })).await;
    match recv(ws).await {
        ServerEvent::RoomCreated {
            room_code,
            player_id,
            state,
        } => {
            assert_eq!(state.players.len(), 1);
            assert!(state.players[0].is_host);
            (room_code, player_id)
        }
        other => panic!("expected room_created, got {other:?}"),
    }
}

/// Joins a room and returns the joiner's id.
async fn join_room(ws: &mut ClientWs, code: &str, name: &str) -> PlayerId {
    send(ws, json!({ "type": "join_room", "roomCode": code, "name": name })).await;
    match recv(ws).await {
        ServerEvent::RoomJoined { player_id, .. } => player_id,
        other => panic!("expected room_joined, got {other:?}"),
    }
}

async fn wait_for_rooms(ctx: &ServerContext, expected: usize) {
    for _ in 0..100 {
        if ctx.room_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("room count never reached {expected}");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_full_round_three_players_reveals_and_rotates_psychic() {
    let server = start_server().await;
    let mut alice = connect(&server.addr).await;
    let mut bob = connect(&server.addr).await;
    let mut charlie = connect(&server.addr).await;

    let (code, alice_id) = create_room(&mut alice, "Alice").await;
    let lowercase = format!(" {} ", code.as_str().to_lowercase());
    let bob_id = join_room(&mut bob, &lowercase, "Bob").await;

    match recv(&mut alice).await {
        ServerEvent::PlayerJoined { player, players } => {
            assert_eq!(player.id, bob_id);
            assert_eq!(player.name, "Bob");
            assert_eq!(players.len(), 2);
        }
        other => panic!("expected player_joined, got {other:?}"),
    }

    let charlie_id = join_room(&mut charlie, code.as_str(), "Charlie").await;
    recv_kind(&mut alice, "player_joined").await;
    recv_kind(&mut bob, "player_joined").await;

    send(&mut alice, json!({ "type": "start_game" })).await;
    let target = match recv(&mut alice).await {
        ServerEvent::GameState { state } => {
            assert_eq!(state.phase, Phase::PsychicClue);
            assert_eq!(state.current_round, 1);
            assert!(state.is_psychic);
            assert_eq!(state.psychic_id.as_ref(), Some(&alice_id));
            state.target_position.expect("psychic sees the target")
        }
        other => panic!("expected game_state, got {other:?}"),
    };
    for guesser in [&mut bob, &mut charlie] {
        match recv(guesser).await {
            ServerEvent::GameState { state } => {
                assert!(!state.is_psychic);
                assert_eq!(state.target_position, None);
                assert_eq!(state.total_guessers, 2);
            }
            other => panic!("expected game_state, got {other:?}"),
        }
    }

    send(&mut alice, json!({ "type": "submit_clue", "clue": "lukewarm tea" })).await;
    for ws in [&mut alice, &mut bob, &mut charlie] {
        match recv(ws).await {
            ServerEvent::ClueSubmitted { clue } => assert_eq!(clue, "lukewarm tea"),
            other => panic!("expected clue_submitted, got {other:?}"),
        }
        match recv(ws).await {
            ServerEvent::GameState { state } => assert_eq!(state.phase, Phase::Dial),
            other => panic!("expected game_state, got {other:?}"),
        }
    }

    send(&mut bob, json!({ "type": "move_dial", "position": 70 })).await;
    send(&mut bob, json!({ "type": "set_ready" })).await;
    match recv(&mut charlie).await {
        ServerEvent::DialUpdate {
            average_dial_position,
            player_id,
        } => {
            assert_eq!(average_dial_position, 60.0);
            assert_eq!(player_id, bob_id);
        }
        other => panic!("expected dial_update, got {other:?}"),
    }
    match recv(&mut charlie).await {
        ServerEvent::ReadyUpdate {
            ready_count,
            total_guessers,
            ..
        } => {
            assert_eq!(ready_count, 1);
            assert_eq!(total_guessers, 2);
        }
        other => panic!("expected ready_update, got {other:?}"),
    }

    send(&mut charlie, json!({ "type": "set_ready" })).await;
    for ws in [&mut alice, &mut bob, &mut charlie] {
        match recv_kind(ws, "reveal_target").await {
            ServerEvent::RevealTarget {
                points,
                distance,
                target: revealed,
                dial,
                total_score,
                current_round,
                total_rounds,
            } => {
                assert_eq!(revealed, target);
                assert_eq!(dial, 60.0);
                assert_eq!(distance, (60.0 - f64::from(target)).abs());
                assert_eq!(points, scoring::points_for(distance));
                assert_eq!(total_score, points);
                assert_eq!(current_round, 1);
                assert_eq!(total_rounds, 10);
            }
            other => panic!("expected reveal_target, got {other:?}"),
        }
        match recv(ws).await {
            ServerEvent::GameState { state } => {
                assert_eq!(state.phase, Phase::Reveal);
                assert_eq!(state.target_position, Some(target));
                assert_eq!(state.scores.len(), 1);
            }
            other => panic!("expected game_state, got {other:?}"),
        }
    }

    send(&mut alice, json!({ "type": "next_round" })).await;
    match recv(&mut bob).await {
        ServerEvent::GameState { state } => {
            assert_eq!(state.phase, Phase::PsychicClue);
            assert_eq!(state.current_round, 2);
            assert_eq!(state.psychic_id.as_ref(), Some(&bob_id));
            assert!(state.is_psychic);
        }
        other => panic!("expected game_state, got {other:?}"),
    }
    match recv(&mut charlie).await {
        ServerEvent::GameState { state } => {
            assert_ne!(state.psychic_id.as_ref(), Some(&charlie_id));
            assert_eq!(state.clue, "");
        }
        other => panic!("expected game_state, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_unknown_room_sends_error() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;

    send(&mut ws, json!({ "type": "join_room", "roomCode": "ZZZZ", "name": "Eve" })).await;
    assert_eq!(recv(&mut ws).await, ServerEvent::error("Room not found"));

    send(&mut ws, json!({ "type": "join_room", "roomCode": "!!", "name": "Eve" })).await;
    assert_eq!(recv(&mut ws).await, ServerEvent::error("Room not found"));

    // The connection is still usable.
    create_room(&mut ws, "Eve").await;
}

#[tokio::test]
async fn test_join_started_game_sends_error() {
    let server = start_server().await;
    let mut alice = connect(&server.addr).await;
    let mut bob = connect(&server.addr).await;
    let mut late = connect(&server.addr).await;

    let (code, _) = create_room(&mut alice, "Alice").await;
    join_room(&mut bob, code.as_str(), "Bob").await;
    send(&mut alice, json!({ "type": "start_game" })).await;
    recv_kind(&mut alice, "game_state").await;

    send(&mut late, json!({ "type": "join_room", "roomCode": code.as_str() })).await;
    assert_eq!(
        recv(&mut late).await,
        ServerEvent::error("Game already in progress")
    );
}

#[tokio::test]
async fn test_host_disconnect_promotes_next_player() {
    let server = start_server().await;
    let mut alice = connect(&server.addr).await;
    let mut bob = connect(&server.addr).await;

    let (code, alice_id) = create_room(&mut alice, "Alice").await;
    let bob_id = join_room(&mut bob, code.as_str(), "Bob").await;

    alice.send(Message::Close(None)).await.expect("close");

    match recv(&mut bob).await {
        ServerEvent::PlayerLeft {
            player_id,
            players,
            new_host_id,
        } => {
            assert_eq!(player_id, alice_id);
            assert_eq!(new_host_id, Some(bob_id.clone()));
            assert_eq!(players.len(), 1);
            assert!(players[0].is_host);
        }
        other => panic!("expected player_left, got {other:?}"),
    }

    // Bob is host now, but alone.
    send(&mut bob, json!({ "type": "start_game" })).await;
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::error("Need at least 2 players")
    );
}

#[tokio::test]
async fn test_unready_guesser_disconnect_completes_reveal() {
    let server = start_server().await;
    let mut alice = connect(&server.addr).await;
    let mut bob = connect(&server.addr).await;
    let mut charlie = connect(&server.addr).await;
    let mut dave = connect(&server.addr).await;

    let (code, _) = create_room(&mut alice, "Alice").await;
    join_room(&mut bob, code.as_str(), "Bob").await;
    join_room(&mut charlie, code.as_str(), "Charlie").await;
    let dave_id = join_room(&mut dave, code.as_str(), "Dave").await;

    send(&mut alice, json!({ "type": "start_game" })).await;
    send(&mut alice, json!({ "type": "submit_clue", "clue": "middle" })).await;
    recv_kind(&mut bob, "clue_submitted").await;
    recv_kind(&mut charlie, "clue_submitted").await;

    // Bob sweeps up to 49 while Charlie sweeps down to 51.
    tokio::join!(
        async {
            for position in 0..50 {
                send(&mut bob, json!({ "type": "move_dial", "position": position })).await;
            }
            send(&mut bob, json!({ "type": "set_ready" })).await;
        },
        async {
            for step in 0..50 {
                let position = 100 - step;
                send(&mut charlie, json!({ "type": "move_dial", "position": position })).await;
            }
            send(&mut charlie, json!({ "type": "set_ready" })).await;
        },
    );

    loop {
        if let ServerEvent::ReadyUpdate {
            ready_count,
            total_guessers,
            ..
        } = recv_kind(&mut alice, "ready_update").await
        {
            assert_eq!(total_guessers, 3);
            if ready_count == 2 {
                break;
            }
        }
    }

    dave.send(Message::Close(None)).await.expect("close");

    match recv(&mut alice).await {
        ServerEvent::PlayerLeft { player_id, players, .. } => {
            assert_eq!(player_id, dave_id);
            assert_eq!(players.len(), 3);
        }
        other => panic!("expected player_left, got {other:?}"),
    }
    match recv(&mut alice).await {
        ServerEvent::RevealTarget {
            dial,
            current_round,
            ..
        } => {
            assert_eq!(dial, 50.0);
            assert_eq!(current_round, 1);
        }
        other => panic!("expected reveal_target, got {other:?}"),
    }
}

#[tokio::test]
async fn test_last_player_leaving_destroys_room() {
    let server = start_server().await;
    let mut alice = connect(&server.addr).await;

    let (code, _) = create_room(&mut alice, "Alice").await;
    wait_for_rooms(&server.ctx, 1).await;

    alice.send(Message::Close(None)).await.expect("close");
    wait_for_rooms(&server.ctx, 0).await;

    let mut bob = connect(&server.addr).await;
    send(&mut bob, json!({ "type": "join_room", "roomCode": code.as_str() })).await;
    assert_eq!(recv(&mut bob).await, ServerEvent::error("Room not found"));
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;

    ws.send(Message::text("not json")).await.expect("send");
    send(&mut ws, json!({ "type": "warp_drive" })).await;
    send(&mut ws, json!({ "type": "move_dial", "position": "far" })).await;
    ws.send(Message::binary(vec![0xff, 0x00])).await.expect("send");

    create_room(&mut ws, "Alice").await;
}

#[tokio::test]
async fn test_gameplay_events_outside_a_room_are_dropped() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;

    send(&mut ws, json!({ "type": "start_game" })).await;
    send(&mut ws, json!({ "type": "set_ready" })).await;
    send(&mut ws, json!({ "type": "emoji_reaction", "emoji": "🎉" })).await;

    // The first thing back is the reply to create_room.
    create_room(&mut ws, "Alice").await;
}

#[tokio::test]
async fn test_second_create_room_is_ignored() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;

    create_room(&mut ws, "Alice").await;
    send(&mut ws, json!({ "type": "create_room", "name": "Alice again" })).await;
    send(&mut ws, json!({ "type": "start_game" })).await;

    assert_eq!(
        recv(&mut ws).await,
        ServerEvent::error("Need at least 2 players")
    );
    assert_eq!(server.ctx.room_count().await, 1);
}

#[tokio::test]
async fn test_emoji_reaction_reaches_others_only() {
    let server = start_server().await;
    let mut alice = connect(&server.addr).await;
    let mut bob = connect(&server.addr).await;

    let (code, alice_id) = create_room(&mut alice, "Alice").await;
    join_room(&mut bob, code.as_str(), "Bob").await;
    recv_kind(&mut alice, "player_joined").await;

    send(&mut alice, json!({ "type": "emoji_reaction", "emoji": "🎉" })).await;
    assert_eq!(
        recv(&mut bob).await,
        ServerEvent::EmojiBroadcast {
            emoji: "🎉".into(),
            player_id: alice_id,
            player_name: "Alice".into(),
        }
    );

    // Alice gets nothing for her own reaction; the next thing she sees is
    // the snapshot from starting the game.
    send(&mut alice, json!({ "type": "start_game" })).await;
    assert_eq!(recv(&mut alice).await.kind(), "game_state");
}

#[tokio::test]
async fn test_health_endpoint_reports_room_count() {
    let server = start_server().await;
    let mut alice = connect(&server.addr).await;
    create_room(&mut alice, "Alice").await;

    let mut stream = tokio::net::TcpStream::connect(&server.health_addr)
        .await
        .expect("connect health");
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    let body = response
        .split("\r\n\r\n")
        .nth(1)
        .expect("response body");
    let body: serde_json::Value = serde_json::from_str(body).expect("json body");
    assert_eq!(body, json!({ "status": "ok", "rooms": 1 }));
}
