//! Per-connection handler: event routing and disconnect cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Open a session and start the writer task
//!   2. Loop: receive frames → decode → route to the registry or a room
//!   3. On close, drop the player from its room (host failover, reveal)
//!      and destroy the room if it is now empty

use std::sync::Arc;

use tokio::task::JoinHandle;
use wavelength_protocol::{ClientEvent, Codec, RoomCode, ServerEvent};
use wavelength_room::{OutboundReceiver, OutboundSender, Profile, RoomAction, RoomError};
use wavelength_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::{ServerContext, WavelengthError};

/// Drop guard that runs disconnect cleanup when the handler exits.
///
/// Cleanup happens even if the handler panics. Since `Drop` is
/// synchronous, we spawn a fire-and-forget task for the async work.
struct DisconnectGuard {
    connection_id: ConnectionId,
    ctx: Arc<ServerContext>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let connection_id = self.connection_id;
        let ctx = Arc::clone(&self.ctx);
        tokio::spawn(async move {
            disconnect(&ctx, connection_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    ctx: Arc<ServerContext>,
) -> Result<(), WavelengthError> {
    let connection_id = conn.id();
    let conn = Arc::new(conn);
    let (outbound, receiver) = tokio::sync::mpsc::unbounded_channel();

    let connections = {
        let mut sessions = ctx.sessions.lock().await;
        sessions.open(connection_id)?;
        sessions.len()
    };
    let _guard = DisconnectGuard {
        connection_id,
        ctx: Arc::clone(&ctx),
    };
    tracing::info!(%connection_id, connections, "client connected");

    let writer = spawn_writer(Arc::clone(&conn), receiver, ctx.codec);

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%connection_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%connection_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match ctx.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%connection_id, error = %e, "dropping undecodable frame");
                continue;
            }
        };

        let kind = event.kind();
        if let Err(e) = route(&ctx, connection_id, &outbound, event).await {
            tracing::warn!(%connection_id, event = kind, error = %e, "event failed");
        }
    }

    writer.abort();
    tracing::info!(%connection_id, "client disconnected");
    // _guard drops here → disconnect cleanup fires.
    Ok(())
}

/// Drains the connection's outbound queue onto the socket, in order.
fn spawn_writer<C: Codec + Copy>(
    conn: Arc<WebSocketConnection>,
    mut receiver: OutboundReceiver,
    codec: C,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(event = event.kind(), error = %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = conn.send(&bytes).await {
                tracing::debug!(connection_id = %conn.id(), error = %e, "send failed");
                break;
            }
        }
    })
}

/// Dispatches one decoded event.
async fn route(
    ctx: &ServerContext,
    connection_id: ConnectionId,
    outbound: &OutboundSender,
    event: ClientEvent,
) -> Result<(), WavelengthError> {
    match event {
        ClientEvent::CreateRoom { name, emoji, color } => {
            create_room(ctx, connection_id, outbound, Profile { name, emoji, color }).await
        }
        ClientEvent::JoinRoom {
            room_code,
            name,
            emoji,
            color,
        } => {
            let profile = Profile { name, emoji, color };
            join_room(ctx, connection_id, outbound, &room_code, profile).await
        }
        ClientEvent::StartGame => forward(ctx, connection_id, RoomAction::StartGame).await,
        ClientEvent::SubmitClue { clue } => {
            forward(ctx, connection_id, RoomAction::SubmitClue(clue)).await
        }
        ClientEvent::MoveDial { position } => {
            forward(ctx, connection_id, RoomAction::MoveDial(position)).await
        }
        ClientEvent::SetReady => forward(ctx, connection_id, RoomAction::SetReady).await,
        ClientEvent::NextRound => forward(ctx, connection_id, RoomAction::NextRound).await,
        ClientEvent::PlayAgain => forward(ctx, connection_id, RoomAction::PlayAgain).await,
        ClientEvent::EmojiReaction { emoji } => {
            forward(ctx, connection_id, RoomAction::EmojiReaction(emoji)).await
        }
    }
}

/// Returns `true` if the connection already belongs to a room.
async fn is_attached(ctx: &ServerContext, connection_id: ConnectionId) -> bool {
    ctx.sessions
        .lock()
        .await
        .get(&connection_id)
        .is_some_and(|session| session.membership.is_some())
}

async fn create_room(
    ctx: &ServerContext,
    connection_id: ConnectionId,
    outbound: &OutboundSender,
    profile: Profile,
) -> Result<(), WavelengthError> {
    if is_attached(ctx, connection_id).await {
        tracing::debug!(%connection_id, "create_room ignored, already in a room");
        return Ok(());
    }

    let player_id = ctx.sessions.lock().await.issue_player_id();
    let handle = ctx
        .rooms
        .lock()
        .await
        .create(player_id.clone(), profile, outbound.clone())
        .await?;

    ctx.sessions
        .lock()
        .await
        .attach(connection_id, handle.room_code().clone(), player_id)?;
    Ok(())
}

async fn join_room(
    ctx: &ServerContext,
    connection_id: ConnectionId,
    outbound: &OutboundSender,
    raw_code: &str,
    profile: Profile,
) -> Result<(), WavelengthError> {
    if is_attached(ctx, connection_id).await {
        tracing::debug!(%connection_id, "join_room ignored, already in a room");
        return Ok(());
    }

    let Ok(room_code) = RoomCode::normalize(raw_code) else {
        tracing::debug!(%connection_id, room_code = raw_code, "join_room with malformed code");
        reject(outbound, &RoomError::UnknownCode(raw_code.to_string()));
        return Ok(());
    };

    let lookup = ctx.rooms.lock().await.get(&room_code);
    let joined = match lookup {
        Ok(handle) => {
            let player_id = ctx.sessions.lock().await.issue_player_id();
            handle
                .join(player_id.clone(), profile, outbound.clone())
                .await
                .map(|()| (handle, player_id))
        }
        Err(err) => Err(err),
    };

    match joined {
        Ok((handle, player_id)) => {
            let attached = ctx.sessions.lock().await.attach(
                connection_id,
                room_code,
                player_id.clone(),
            );
            if let Err(err) = attached {
                let _ = handle.leave(player_id).await;
                return Err(err.into());
            }
            Ok(())
        }
        Err(RoomError::Unavailable(room_code)) => {
            reject(outbound, &RoomError::NotFound(room_code));
            Ok(())
        }
        Err(err) if err.is_user_facing() => {
            reject(outbound, &err);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Sends a rejection the player can act on.
fn reject(outbound: &OutboundSender, err: &RoomError) {
    let _ = outbound.send(ServerEvent::error(err.to_string()));
}

/// Hands a gameplay event to the sender's room.
///
/// A connection that is not in a room has nothing to act on, so the event
/// is dropped.
async fn forward(
    ctx: &ServerContext,
    connection_id: ConnectionId,
    action: RoomAction,
) -> Result<(), WavelengthError> {
    let membership = ctx
        .sessions
        .lock()
        .await
        .get(&connection_id)
        .and_then(|session| session.membership.clone());
    let Some(membership) = membership else {
        tracing::debug!(%connection_id, action = action.name(), "no room, event dropped");
        return Ok(());
    };

    let handle = match ctx.rooms.lock().await.get(&membership.room_code) {
        Ok(handle) => handle,
        Err(_) => {
            tracing::debug!(room_code = %membership.room_code, "room already gone, event dropped");
            return Ok(());
        }
    };
    handle.act(membership.player_id, action).await?;
    Ok(())
}

/// Removes a closed connection from its room.
///
/// The room handles host failover and any reveal the departure completes;
/// an emptied room is destroyed here.
async fn disconnect(ctx: &ServerContext, connection_id: ConnectionId) {
    let session = match ctx.sessions.lock().await.close(connection_id) {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!(%connection_id, error = %e, "no session to close");
            return;
        }
    };
    let Some(membership) = session.membership else {
        return;
    };

    let handle = match ctx.rooms.lock().await.get(&membership.room_code) {
        Ok(handle) => handle,
        Err(_) => return,
    };

    match handle.leave(membership.player_id.clone()).await {
        Ok(0) => {
            if let Err(e) = ctx.rooms.lock().await.destroy(&membership.room_code).await {
                tracing::debug!(room_code = %membership.room_code, error = %e, "room already destroyed");
            }
        }
        Ok(remaining) => {
            tracing::debug!(
                room_code = %membership.room_code,
                player_id = %membership.player_id,
                remaining,
                "player left room"
            );
        }
        Err(e) => {
            tracing::debug!(
                room_code = %membership.room_code,
                player_id = %membership.player_id,
                error = %e,
                "leave failed"
            );
        }
    }
}
