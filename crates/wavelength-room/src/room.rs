//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands are handled one at a time, and every
//! event a command produces is queued on the members' outbound channels
//! before the next command is taken. Members therefore observe a room's
//! broadcasts in the order the room processed them.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use wavelength_protocol::{Phase, PlayerId, Recipient, RoomCode, ServerEvent};

use crate::game::{Outbound, Profile, Room};
use crate::RoomError;

/// Outbound queue of one connection.
///
/// The room actor holds one per member and is the only thing that fans
/// events out. Unbounded so a room never waits on a slow client; the
/// connection's writer task drains it in order.
pub type OutboundSender = mpsc::UnboundedSender<ServerEvent>;

/// Receiving half of [`OutboundSender`], owned by the writer task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// A gameplay request from a member, routed to its room.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomAction {
    StartGame,
    SubmitClue(String),
    MoveDial(f64),
    SetReady,
    NextRound,
    PlayAgain,
    EmojiReaction(String),
}

impl RoomAction {
    /// The wire name of the request, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartGame => "start_game",
            Self::SubmitClue(_) => "submit_clue",
            Self::MoveDial(_) => "move_dial",
            Self::SetReady => "set_ready",
            Self::NextRound => "next_round",
            Self::PlayAgain => "play_again",
            Self::EmojiReaction(_) => "emoji_reaction",
        }
    }
}

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    /// Add a player and register where its events go.
    Join {
        player_id: PlayerId,
        profile: Profile,
        outbound: OutboundSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player. Replies with the number of members left.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// A gameplay request from a member.
    Act { sender: PlayerId, action: RoomAction },

    /// Request room metadata.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Stop the actor.
    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub room_code: RoomCode,
    pub phase: Phase,
    pub player_count: usize,
    pub max_players: usize,
    pub host_id: Option<PlayerId>,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone; the registry holds one per room and the router clones
/// it out so it never awaits a room while holding the registry.
#[derive(Clone)]
pub struct RoomHandle {
    room_code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's code.
    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    /// A handle with no actor behind it.
    #[cfg(test)]
    pub(crate) fn detached(room_code: RoomCode, sender: mpsc::Sender<RoomCommand>) -> Self {
        Self { room_code, sender }
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_code.clone())
    }

    /// Adds a player. On success the room has already queued
    /// `room_created`/`room_joined` on `outbound`.
    pub async fn join(
        &self,
        player_id: PlayerId,
        profile: Profile,
        outbound: OutboundSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                profile,
                outbound,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Removes a player and returns how many members remain.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Delivers a gameplay request (fire-and-forget).
    ///
    /// Rejections are handled inside the room: actionable ones reach the
    /// sender as an `error` event, the rest are logged.
    pub async fn act(&self, sender: PlayerId, action: RoomAction) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Act { sender, action })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Per-member outbound channels.
    members: HashMap<PlayerId, OutboundSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_code = %self.room.code(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player_id,
                    profile,
                    outbound,
                    reply,
                } => {
                    let result = self.handle_join(player_id, profile, outbound);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    let result = self.handle_leave(player_id);
                    let _ = reply.send(result);
                }
                RoomCommand::Act { sender, action } => {
                    self.handle_action(sender, action);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_code = %self.room.code(), "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_code = %self.room.code(), "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        profile: Profile,
        outbound: OutboundSender,
    ) -> Result<(), RoomError> {
        let out = self.room.join(player_id.clone(), profile)?;
        self.members.insert(player_id, outbound);
        self.dispatch(out);
        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<usize, RoomError> {
        let out = self.room.leave(&player_id)?;
        self.members.remove(&player_id);
        self.dispatch(out);
        Ok(self.room.len())
    }

    fn handle_action(&mut self, sender: PlayerId, action: RoomAction) {
        let operation = action.name();
        let result = match action {
            RoomAction::StartGame => self.room.start_game(&sender),
            RoomAction::SubmitClue(clue) => self.room.submit_clue(&sender, clue),
            RoomAction::MoveDial(position) => self.room.move_dial(&sender, position),
            RoomAction::SetReady => self.room.set_ready(&sender),
            RoomAction::NextRound => self.room.next_round(&sender),
            RoomAction::PlayAgain => self.room.play_again(&sender),
            RoomAction::EmojiReaction(emoji) => Ok(self.room.emoji_reaction(&sender, emoji)),
        };

        match result {
            Ok(out) => self.dispatch(out),
            Err(err) if err.is_user_facing() => {
                tracing::debug!(
                    room_code = %self.room.code(),
                    %sender,
                    operation,
                    error = %err,
                    "operation rejected"
                );
                self.send_to(&sender, ServerEvent::error(err.to_string()));
            }
            Err(err) => {
                tracing::debug!(
                    room_code = %self.room.code(),
                    %sender,
                    operation,
                    error = %err,
                    "operation ignored"
                );
            }
        }
    }

    /// Delivers the room's output in order.
    fn dispatch(&self, out: Vec<Outbound>) {
        for item in out {
            match item {
                Outbound::Event(recipient, event) => self.send_event(&recipient, event),
                Outbound::Snapshot => {
                    for player in self.room.players() {
                        let state = self.room.public_state(&player.id);
                        self.send_to(&player.id, ServerEvent::GameState { state });
                    }
                }
            }
        }
    }

    fn send_event(&self, recipient: &Recipient, event: ServerEvent) {
        if let Recipient::Player(target) = recipient {
            self.send_to(target, event);
            return;
        }
        for player in self.room.players() {
            if recipient.includes(&player.id) {
                self.send_to(&player.id, event.clone());
            }
        }
    }

    /// Queues an event for one member. Silently drops it if the member's
    /// connection is gone.
    fn send_to(&self, player_id: &PlayerId, event: ServerEvent) {
        if let Some(outbound) = self.members.get(player_id) {
            let _ = outbound.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_code: self.room.code().clone(),
            phase: self.room.phase(),
            player_count: self.room.len(),
            max_players: self.room.max_players(),
            host_id: self.room.host_id().cloned(),
        }
    }
}

/// Spawns a room actor task and returns a handle to communicate with it.
///
/// `channel_size` controls backpressure: once the queue is full, senders
/// wait.
pub(crate) fn spawn_room(room: Room, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let room_code = room.code().clone();

    let actor = RoomActor {
        room,
        members: HashMap::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        room_code,
        sender: tx,
    }
}
