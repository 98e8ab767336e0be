//! The application extension point: lifecycle hooks.
//!
//! A room by itself only manages membership and message routing. The
//! application gives it meaning by implementing [`RoomHooks`] — a trait
//! with a default no-op for every hook, so a room type only overrides
//! what it cares about.
//!
//! Hooks are async (they often load data or talk to other services) and
//! their futures must be `Send`, because the room actor runs on Tokio's
//! multi-threaded runtime. The explicit `impl Future + Send` return
//! style (rather than `async fn`) is what makes that bound expressible
//! on a trait.
//!
//! Hook failures are logged, never fatal: a room whose `on_create` blew
//! up still becomes Ready, and a failing `on_join` doesn't abort the
//! client's handshake. Rooms are long-lived shared spaces; one bad hook
//! run shouldn't take down everyone in them.

use std::future::Future;

use parlor_protocol::{ClientId, RoomId};
use parlor_session::ClientSession;
use serde_json::Value;

use crate::{HandlerRegistry, RoomContext, RoomError};

/// What a hook can fail with. Applications bring their own error types.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// What the creation hook sees of the room: its identity, plus the
/// handler tables to register protocol/action/transfer handlers into.
///
/// Registration is only possible here — after `on_create` returns, the
/// routing tables are fixed for the room's lifetime.
pub struct RoomSetup<'a, R> {
    room_id: &'a RoomId,
    handlers: &'a mut HandlerRegistry<R>,
}

impl<'a, R> RoomSetup<'a, R> {
    pub(crate) fn new(
        room_id: &'a RoomId,
        handlers: &'a mut HandlerRegistry<R>,
    ) -> Self {
        Self { room_id, handlers }
    }

    /// The room's id.
    pub fn room_id(&self) -> &RoomId {
        self.room_id
    }

    /// Registers a handler for a protocol string.
    ///
    /// # Errors
    /// Fails if the name is reserved for the join handshake or already
    /// registered.
    pub fn on_protocol(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&mut R, &mut RoomContext, &ClientSession)
            + Send
            + 'static,
    ) -> Result<(), RoomError> {
        self.handlers.register_protocol(name, handler)
    }

    /// Registers a handler for an action name.
    ///
    /// # Errors
    /// Fails if the name is already registered.
    pub fn on_action(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&mut R, &mut RoomContext, &ClientSession)
            + Send
            + 'static,
    ) -> Result<(), RoomError> {
        self.handlers.register_action(name, handler)
    }

    /// Registers a handler for a transfer channel.
    ///
    /// # Errors
    /// Fails if the name is already registered.
    pub fn on_transfer(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&mut R, &mut RoomContext, &ClientSession, Value)
            + Send
            + 'static,
    ) -> Result<(), RoomError> {
        self.handlers.register_transfer(name, handler)
    }
}

/// A read-only snapshot of room membership, handed to
/// [`RoomHooks::room_state`].
#[derive(Debug, Clone)]
pub struct RoomView {
    /// The room's id.
    pub room_id: RoomId,
    /// Ids of all clients currently joined (including reconnecting ones).
    pub client_ids: Vec<ClientId>,
}

/// Lifecycle hooks a room application implements.
///
/// The lifecycle, in order:
///
/// 1. `on_create` — once, while the room is Creating. Register handlers
///    here. Joins arriving during this hook are deferred until it ends.
/// 2. `on_auth` — per joining client, before anything else. Returning
///    `false` rejects the client with `JOIN_FAILED`.
/// 3. `on_join` — the client passed auth and was told to start its own
///    join procedures (`INITIATE_JOIN`). Events sent to the client here
///    are queued.
/// 4. `on_joined` — the client reported `FINISHED_JOINING_GAME` and is
///    now a member. Events sent here are delivered, then the queued
///    backlog flushes.
/// 5. `on_leave` — the client is leaving (or its connection dropped).
///    Call [`RoomContext::set_reconnecting`] to hold its place.
/// 6. `on_dispose` — once, when the room shuts down.
pub trait RoomHooks: Send + Sized + 'static {
    /// Called once while the room is being created.
    fn on_create(
        &mut self,
        room: &mut RoomSetup<'_, Self>,
    ) -> impl Future<Output = Result<(), HookError>> + Send {
        let _ = room;
        async { Ok(()) }
    }

    /// Decides whether a client may join. Defaults to accepting everyone.
    fn on_auth(
        &mut self,
        client: &ClientSession,
    ) -> impl Future<Output = bool> + Send {
        let _ = client;
        async { true }
    }

    /// Called after a client passes auth and is told to initiate joining.
    fn on_join(
        &mut self,
        client: &ClientSession,
        ctx: &mut RoomContext,
    ) -> impl Future<Output = Result<(), HookError>> + Send {
        let _ = (client, ctx);
        async { Ok(()) }
    }

    /// Called when a client completes its join and becomes a member.
    fn on_joined(
        &mut self,
        client: &ClientSession,
        ctx: &mut RoomContext,
    ) -> impl Future<Output = Result<(), HookError>> + Send {
        let _ = (client, ctx);
        async { Ok(()) }
    }

    /// Called when a client leaves or its connection drops.
    fn on_leave(
        &mut self,
        client: &ClientSession,
        ctx: &mut RoomContext,
    ) -> impl Future<Output = Result<(), HookError>> + Send {
        let _ = (client, ctx);
        async { Ok(()) }
    }

    /// Called once when the room disposes.
    fn on_dispose(&mut self) -> impl Future<Output = Result<(), HookError>> + Send {
        async { Ok(()) }
    }

    /// The room-level state view, broadcast as `updateRoomState` when a
    /// [`crate::StateChange::Room`] is notified (and when membership
    /// changes).
    fn room_state(&self, view: &RoomView) -> Value {
        let _ = view;
        Value::Null
    }

    /// The application state view, broadcast as `updateGameState` when a
    /// [`crate::StateChange::Game`] is notified.
    fn game_state(&self) -> Value {
        Value::Null
    }
}
