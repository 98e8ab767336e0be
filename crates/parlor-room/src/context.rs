//! The context handed to hooks and message handlers.
//!
//! Hooks and handlers don't touch sessions or channels directly — they
//! record *effects* on a [`RoomContext`], and the room actor applies them
//! after the hook returns. This keeps handler signatures simple (no
//! borrow gymnastics over the actor's internals) and guarantees effects
//! apply in the order they were recorded.

use parlor_protocol::{ClientId, RoomId, ServerEvent};

/// Which of the application's state views changed.
///
/// Notifying a change makes the room broadcast the corresponding view
/// (`updateRoomState` from [`crate::RoomHooks::room_state`],
/// `updateGameState` from [`crate::RoomHooks::game_state`]) to every
/// client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Room-level state: who is here, lobby metadata.
    Room,
    /// Application/game state: whatever the room is actually about.
    Game,
}

/// An effect recorded by a hook or handler, applied by the actor.
#[derive(Debug)]
pub(crate) enum Effect {
    /// Deliver an event to one client (queued if they're still joining).
    Send {
        client: ClientId,
        event: ServerEvent,
    },
    /// Like `Send`, but tag the event with an ack correlation id; when
    /// the client echoes the id, run the named protocol handler.
    SendWithAck {
        client: ClientId,
        event: ServerEvent,
        on_ack: String,
    },
    /// Deliver an event to every client.
    Broadcast(ServerEvent),
    /// Broadcast the named state view.
    StateChanged(StateChange),
    /// Dispose the room once the current batch of effects is applied.
    Dispose,
}

/// What a hook or handler sees of the room, plus its effect outbox.
#[derive(Debug)]
pub struct RoomContext {
    room_id: RoomId,
    client_count: usize,
    reconnecting: bool,
    effects: Vec<Effect>,
}

impl RoomContext {
    pub(crate) fn new(room_id: RoomId, client_count: usize) -> Self {
        Self {
            room_id,
            client_count,
            reconnecting: false,
            effects: Vec::new(),
        }
    }

    /// The room's id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Number of clients currently joined to the room.
    pub fn client_count(&self) -> usize {
        self.client_count
    }

    /// Sends an event to one client.
    pub fn send(&mut self, client: &ClientId, event: ServerEvent) {
        self.effects.push(Effect::Send {
            client: client.clone(),
            event,
        });
    }

    /// Sends an event to one client and requests an acknowledgment.
    ///
    /// The room allocates a correlation id, attaches it to the event, and
    /// runs the protocol handler registered under `on_ack` when the
    /// client echoes the id back. Unknown or replayed ids are ignored.
    pub fn send_with_ack(
        &mut self,
        client: &ClientId,
        event: ServerEvent,
        on_ack: impl Into<String>,
    ) {
        self.effects.push(Effect::SendWithAck {
            client: client.clone(),
            event,
            on_ack: on_ack.into(),
        });
    }

    /// Sends an event to every client in the room.
    pub fn broadcast(&mut self, event: ServerEvent) {
        self.effects.push(Effect::Broadcast(event));
    }

    /// Declares that a state view changed; the room broadcasts the
    /// corresponding snapshot after the current hook returns.
    pub fn notify(&mut self, change: StateChange) {
        self.effects.push(Effect::StateChanged(change));
    }

    /// Asks the room to dispose itself.
    pub fn dispose(&mut self) {
        self.effects.push(Effect::Dispose);
    }

    /// From a leave hook: hold the departing client's place instead of
    /// removing them, marking the session as reconnecting.
    pub fn set_reconnecting(&mut self, reconnecting: bool) {
        self.reconnecting = reconnecting;
    }

    pub(crate) fn reconnecting(&self) -> bool {
        self.reconnecting
    }

    pub(crate) fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}
