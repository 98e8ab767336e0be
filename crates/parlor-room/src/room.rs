//! Room actor: an isolated Tokio task that owns one room.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. This is the actor model — no shared mutable
//! state, just message passing. The connection layer holds a cheap
//! [`RoomHandle`] clone per client and never touches room internals.
//!
//! The actor runs in two phases. While Creating, only the creation hook
//! executes; join/leave commands that race in are deferred in arrival
//! order. Once Ready, the deferred commands drain and the actor settles
//! into its command loop, with an optional auto-dispose deadline armed
//! whenever the room sits empty.

use std::collections::{HashMap, VecDeque};

use parlor_protocol::{protocol, ClientEnvelope, ClientId, GameMessage, RoomId, ServerEvent};
use parlor_session::{ClientSession, ClientStatus};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::context::Effect;
use crate::handlers::AckRegistry;
use crate::{
    HandlerRegistry, RoomContext, RoomError, RoomHooks, RoomOptions,
    RoomSetup, RoomStatus, RoomView, StateChange,
};

/// Command channel size for room actors.
const CHANNEL_SIZE: usize = 64;

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in `Info` is a reply channel — the caller sends
/// the command and awaits the response. Everything else is
/// fire-and-forget.
pub(crate) enum RoomCommand {
    /// Begin the join handshake for a new client session.
    Join { session: ClientSession },

    /// Remove a client (explicit leave or dropped connection).
    Leave { client_id: ClientId },

    /// Deliver a decoded envelope from a client.
    Message {
        client_id: ClientId,
        envelope: ClientEnvelope,
    },

    /// Request a snapshot of room metadata.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Shut the room down.
    Dispose,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's id.
    pub room_id: RoomId,
    /// Current lifecycle status.
    pub status: RoomStatus,
    /// Number of clients joined to the room.
    pub client_count: usize,
}

/// Handle to a running room actor. Cheap to clone — just an
/// `mpsc::Sender` wrapper plus the room id.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Hands a new client session to the room, starting its join
    /// handshake. The room replies to the client over the session's own
    /// channel, so there is no result to wait for here.
    pub async fn client_join(
        &self,
        session: ClientSession,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Join { session }).await
    }

    /// Tells the room a client left or its connection dropped.
    pub async fn client_leave(
        &self,
        client_id: ClientId,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Leave { client_id }).await
    }

    /// Delivers a decoded client envelope to the room.
    pub async fn message(
        &self,
        client_id: ClientId,
        envelope: ClientEnvelope,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Message {
            client_id,
            envelope,
        })
        .await
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Info { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Tells the room to dispose itself.
    pub async fn dispose(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Dispose).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// Spawns a room actor task and returns a handle to it.
///
/// `disposed` is notified with the room's id exactly once, when the room
/// finishes disposing — the registry uses it to unregister the room.
pub fn spawn_room<R: RoomHooks>(
    hooks: R,
    options: RoomOptions,
    disposed: mpsc::UnboundedSender<RoomId>,
) -> RoomHandle {
    let room_id = options
        .room_id
        .clone()
        .unwrap_or_else(RoomId::generate);
    let (tx, rx) = mpsc::channel(CHANNEL_SIZE);

    let actor = RoomActor {
        room_id: room_id.clone(),
        options,
        status: RoomStatus::Creating,
        hooks,
        handlers: HandlerRegistry::new(),
        clients: HashMap::new(),
        joining: HashMap::new(),
        acks: AckRegistry::default(),
        receiver: rx,
        disposed,
        dispose_at: None,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<R: RoomHooks> {
    room_id: RoomId,
    options: RoomOptions,
    status: RoomStatus,
    hooks: R,
    handlers: HandlerRegistry<R>,
    /// Members: clients that completed the join handshake (including
    /// reconnecting ones whose place is being held).
    clients: HashMap<ClientId, ClientSession>,
    /// Clients mid-handshake (Joining) or denied by auth (Rejected).
    joining: HashMap<ClientId, ClientSession>,
    acks: AckRegistry,
    receiver: mpsc::Receiver<RoomCommand>,
    disposed: mpsc::UnboundedSender<RoomId>,
    /// Auto-dispose deadline; `Some` only while the room is empty and
    /// auto-disposal is enabled.
    dispose_at: Option<Instant>,
}

impl<R: RoomHooks> RoomActor<R> {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room creating");

        let (pending, dispose_requested) = self.create().await;

        if dispose_requested {
            // Disposal arrived before the room ever became Ready;
            // deferred joins are discarded, not serviced.
            tracing::info!(
                room_id = %self.room_id,
                deferred = pending.len(),
                "room disposed before becoming ready"
            );
            self.dispose().await;
            return;
        }

        self.status = RoomStatus::Ready;
        tracing::info!(room_id = %self.room_id, "room ready");
        self.update_dispose_deadline();

        // Drain the commands that raced in during creation, in order.
        for cmd in pending {
            if self.handle_command(cmd).await {
                self.dispose().await;
                return;
            }
        }

        loop {
            let idle = self.dispose_at;
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if self.handle_command(cmd).await {
                                break;
                            }
                        }
                        // Every handle dropped; nothing can reach the
                        // room again.
                        None => break,
                    }
                }
                _ = tokio::time::sleep_until(idle.unwrap_or_else(Instant::now)),
                    if idle.is_some() =>
                {
                    tracing::info!(
                        room_id = %self.room_id,
                        "room idle past deadline, auto-disposing"
                    );
                    break;
                }
            }
        }

        self.dispose().await;
    }

    /// Phase one: runs the creation hook while deferring join/leave
    /// traffic. Returns the deferred commands and whether disposal was
    /// requested mid-creation.
    async fn create(&mut self) -> (VecDeque<RoomCommand>, bool) {
        let mut pending = VecDeque::new();
        let mut dispose_requested = false;
        let mut channel_open = true;

        let mut setup = RoomSetup::new(&self.room_id, &mut self.handlers);
        let create = self.hooks.on_create(&mut setup);
        tokio::pin!(create);

        loop {
            tokio::select! {
                result = &mut create => {
                    if let Err(err) = result {
                        // Failing to set up is not fatal: the room still
                        // becomes Ready so clients that were already
                        // directed here aren't stranded.
                        tracing::error!(
                            room_id = %self.room_id,
                            error = %err,
                            "creation hook failed"
                        );
                    }
                    break;
                }
                cmd = self.receiver.recv(), if channel_open => {
                    match cmd {
                        Some(RoomCommand::Dispose) => dispose_requested = true,
                        Some(RoomCommand::Info { reply }) => {
                            let _ = reply.send(RoomInfo {
                                room_id: self.room_id.clone(),
                                status: RoomStatus::Creating,
                                client_count: 0,
                            });
                        }
                        Some(cmd) => pending.push_back(cmd),
                        None => {
                            channel_open = false;
                            dispose_requested = true;
                        }
                    }
                }
            }
        }

        (pending, dispose_requested)
    }

    /// Handles one command. Returns `true` when the room should dispose.
    async fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join { session } => self.client_join(session).await,
            RoomCommand::Leave { client_id } => {
                self.client_leave(client_id).await
            }
            RoomCommand::Message {
                client_id,
                envelope,
            } => self.dispatch(client_id, envelope).await,
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
                false
            }
            RoomCommand::Dispose => true,
        }
    }

    // -----------------------------------------------------------------
    // Join handshake
    // -----------------------------------------------------------------

    async fn client_join(&mut self, session: ClientSession) -> bool {
        self.dispose_at = None;
        let client_id = session.id().clone();

        // A returning client whose place was held: clear the stale
        // session and run the handshake fresh.
        if self.clients.get(&client_id).map(|s| s.status())
            == Some(ClientStatus::Reconnecting)
        {
            self.clients.remove(&client_id);
            tracing::info!(
                room_id = %self.room_id,
                %client_id,
                "client rejoining after reconnect"
            );
        }

        if !self.hooks.on_auth(&session).await {
            tracing::warn!(
                room_id = %self.room_id,
                %client_id,
                "client failed authentication"
            );
            session.send_now(ServerEvent::join_failed(
                "Cannot authenticate room joining.",
            ));
            let mut session = session;
            session.set_status(ClientStatus::Rejected);
            // Kept so the slot is known, but never routed to or from.
            self.joining.insert(client_id, session);
            self.update_dispose_deadline();
            return false;
        }

        session.send_now(ServerEvent::initiate_join());

        let mut ctx = self.context();
        if let Err(err) = self.hooks.on_join(&session, &mut ctx).await {
            tracing::error!(
                room_id = %self.room_id,
                %client_id,
                error = %err,
                "join hook failed"
            );
        }

        tracing::debug!(
            room_id = %self.room_id,
            %client_id,
            "client joining"
        );
        self.joining.insert(client_id, session);
        self.apply(ctx).await
    }

    /// The client reported `FINISHED_JOINING_GAME`: promote it to a
    /// member, run `on_joined`, then flush its queued backlog.
    async fn finish_join(&mut self, client_id: ClientId) -> bool {
        let Some(mut session) = self.joining.remove(&client_id) else {
            tracing::debug!(
                room_id = %self.room_id,
                %client_id,
                "join completion from unknown client, ignoring"
            );
            return false;
        };

        session.set_status(ClientStatus::Joined);
        self.clients.insert(client_id.clone(), session);
        tracing::info!(
            room_id = %self.room_id,
            %client_id,
            clients = self.clients.len(),
            "client joined"
        );

        let mut ctx = self.context();
        {
            let session = self
                .clients
                .get(&client_id)
                .expect("just inserted this session");
            if let Err(err) = self.hooks.on_joined(session, &mut ctx).await {
                tracing::error!(
                    room_id = %self.room_id,
                    %client_id,
                    error = %err,
                    "joined hook failed"
                );
            }
        }
        let dispose = self.apply(ctx).await;

        // Sends made inside on_joined were delivered live above; only
        // now does the pre-join backlog drain, in arrival order.
        if let Some(session) = self.clients.get_mut(&client_id) {
            session.flush();
        }

        self.broadcast_room_state();
        dispose
    }

    /// The client reported `FAILED_JOINING_GAME`: its own join
    /// procedures broke, so the handshake is abandoned. The session is
    /// kept as Rejected (like an auth failure) until its connection
    /// drops.
    fn abort_join(&mut self, client_id: &ClientId) {
        if let Some(session) = self.joining.get_mut(client_id) {
            session.set_status(ClientStatus::Rejected);
            tracing::warn!(
                room_id = %self.room_id,
                %client_id,
                "client failed its join procedures"
            );
        }
    }

    // -----------------------------------------------------------------
    // Leaving
    // -----------------------------------------------------------------

    async fn client_leave(&mut self, client_id: ClientId) -> bool {
        if self.joining.remove(&client_id).is_some() {
            tracing::debug!(
                room_id = %self.room_id,
                %client_id,
                "client left before completing join"
            );
            self.update_dispose_deadline();
            return false;
        }

        let Some(mut session) = self.clients.remove(&client_id) else {
            tracing::debug!(
                room_id = %self.room_id,
                %client_id,
                "leave for unknown client, ignoring"
            );
            return false;
        };

        session.set_status(ClientStatus::Leaving);
        let mut ctx = self.context();
        if let Err(err) = self.hooks.on_leave(&session, &mut ctx).await {
            tracing::error!(
                room_id = %self.room_id,
                %client_id,
                error = %err,
                "leave hook failed"
            );
        }

        if ctx.reconnecting() {
            // The application wants this client's place held.
            session.set_status(ClientStatus::Reconnecting);
            self.clients.insert(client_id.clone(), session);
            tracing::info!(
                room_id = %self.room_id,
                %client_id,
                "client disconnected, holding place"
            );
        } else {
            tracing::info!(
                room_id = %self.room_id,
                %client_id,
                clients = self.clients.len(),
                "client left"
            );
        }

        let dispose = self.apply(ctx).await;
        self.broadcast_room_state();
        self.update_dispose_deadline();
        dispose
    }

    // -----------------------------------------------------------------
    // Message routing
    // -----------------------------------------------------------------

    async fn dispatch(
        &mut self,
        client_id: ClientId,
        envelope: ClientEnvelope,
    ) -> bool {
        let status = self
            .clients
            .get(&client_id)
            .or_else(|| self.joining.get(&client_id))
            .map(|s| s.status());

        match status {
            None => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %client_id,
                    "message from unknown client, dropping"
                );
                return false;
            }
            Some(status) if !status.accepts_messages() => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %client_id,
                    %status,
                    "message from rejected client, dropping"
                );
                return false;
            }
            Some(_) => {}
        }

        match envelope {
            ClientEnvelope::Protocol(name) => match name.as_str() {
                protocol::FINISHED_JOINING_GAME => {
                    self.finish_join(client_id).await
                }
                protocol::FAILED_JOINING_GAME => {
                    self.abort_join(&client_id);
                    false
                }
                _ => {
                    self.run_protocol_handler(&client_id, &name).await
                }
            },
            ClientEnvelope::Game(GameMessage::Action(name)) => {
                let mut ctx = self.context();
                let session = self
                    .clients
                    .get(&client_id)
                    .or_else(|| self.joining.get(&client_id))
                    .expect("session checked above");
                match self.handlers.action_mut(&name) {
                    Some(handler) => {
                        handler(&mut self.hooks, &mut ctx, session)
                    }
                    // Unmatched names are ignored so older rooms
                    // tolerate newer clients.
                    None => tracing::trace!(
                        room_id = %self.room_id,
                        %client_id,
                        action = %name,
                        "no handler for action"
                    ),
                }
                self.apply(ctx).await
            }
            ClientEnvelope::Game(GameMessage::Transfer(transfer)) => {
                let mut ctx = self.context();
                let session = self
                    .clients
                    .get(&client_id)
                    .or_else(|| self.joining.get(&client_id))
                    .expect("session checked above");
                match self.handlers.transfer_mut(&transfer.name) {
                    Some(handler) => handler(
                        &mut self.hooks,
                        &mut ctx,
                        session,
                        transfer.data,
                    ),
                    None => tracing::trace!(
                        room_id = %self.room_id,
                        %client_id,
                        transfer = %transfer.name,
                        "no handler for transfer"
                    ),
                }
                self.apply(ctx).await
            }
            ClientEnvelope::Ack(id) => {
                let Some(name) = self.acks.take(id) else {
                    tracing::debug!(
                        room_id = %self.room_id,
                        %client_id,
                        ack = id,
                        "unknown or replayed ack id, ignoring"
                    );
                    return false;
                };
                self.run_protocol_handler(&client_id, &name).await
            }
        }
    }

    async fn run_protocol_handler(
        &mut self,
        client_id: &ClientId,
        name: &str,
    ) -> bool {
        let mut ctx = self.context();
        let session = self
            .clients
            .get(client_id)
            .or_else(|| self.joining.get(client_id))
            .expect("session checked above");
        match self.handlers.protocol_mut(name) {
            Some(handler) => handler(&mut self.hooks, &mut ctx, session),
            None => tracing::trace!(
                room_id = %self.room_id,
                %client_id,
                protocol = %name,
                "no handler for protocol message"
            ),
        }
        self.apply(ctx).await
    }

    // -----------------------------------------------------------------
    // Effects
    // -----------------------------------------------------------------

    /// Applies the effects a hook or handler recorded. Returns `true`
    /// when one of them was a disposal request.
    async fn apply(&mut self, mut ctx: RoomContext) -> bool {
        let mut dispose = false;
        for effect in ctx.take_effects() {
            match effect {
                Effect::Send { client, event } => self.send_to(&client, event),
                Effect::SendWithAck {
                    client,
                    event,
                    on_ack,
                } => {
                    let id = self.acks.register(on_ack);
                    self.send_to(&client, event.with_ack(id));
                }
                Effect::Broadcast(event) => self.broadcast(event),
                Effect::StateChanged(StateChange::Room) => {
                    self.broadcast_room_state();
                }
                Effect::StateChanged(StateChange::Game) => {
                    let event = ServerEvent::new(
                        protocol::UPDATE_GAME_STATE,
                        self.hooks.game_state(),
                    );
                    self.broadcast(event);
                }
                Effect::Dispose => dispose = true,
            }
        }
        dispose
    }

    fn send_to(&mut self, client_id: &ClientId, event: ServerEvent) {
        let session = self
            .clients
            .get_mut(client_id)
            .or_else(|| self.joining.get_mut(client_id));
        match session {
            Some(session)
                if session.status() != ClientStatus::Rejected =>
            {
                session.send(event);
            }
            _ => tracing::debug!(
                room_id = %self.room_id,
                %client_id,
                event = %event.name,
                "dropping event for absent client"
            ),
        }
    }

    /// Delivers an event to every reachable session; joining clients
    /// queue it, rejected ones are skipped.
    fn broadcast(&mut self, event: ServerEvent) {
        for session in self
            .clients
            .values_mut()
            .chain(self.joining.values_mut())
        {
            if session.status() == ClientStatus::Rejected {
                continue;
            }
            session.send(event.clone());
        }
    }

    fn broadcast_room_state(&mut self) {
        let view = self.view();
        let event = ServerEvent::new(
            protocol::UPDATE_ROOM_STATE,
            self.hooks.room_state(&view),
        );
        self.broadcast(event);
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Arms the auto-dispose deadline when the room is empty, cancels
    /// it otherwise.
    fn update_dispose_deadline(&mut self) {
        if self.options.auto_dispose
            && self.clients.is_empty()
            && self.joining.is_empty()
        {
            if self.dispose_at.is_none() {
                tracing::debug!(
                    room_id = %self.room_id,
                    after = ?self.options.dispose_after,
                    "room empty, arming auto-dispose"
                );
                self.dispose_at =
                    Some(Instant::now() + self.options.dispose_after);
            }
        } else {
            self.dispose_at = None;
        }
    }

    /// Disposes the room. Idempotent — runs the hook and notifies the
    /// registry exactly once.
    async fn dispose(&mut self) {
        if self.status == RoomStatus::Disposing {
            return;
        }
        self.status = RoomStatus::Disposing;

        if let Err(err) = self.hooks.on_dispose().await {
            tracing::error!(
                room_id = %self.room_id,
                error = %err,
                "dispose hook failed"
            );
        }

        self.clients.clear();
        self.joining.clear();
        let _ = self.disposed.send(self.room_id.clone());
        tracing::info!(room_id = %self.room_id, "room disposed");
    }

    fn context(&self) -> RoomContext {
        RoomContext::new(self.room_id.clone(), self.clients.len())
    }

    fn view(&self) -> RoomView {
        RoomView {
            room_id: self.room_id.clone(),
            client_ids: self.clients.keys().cloned().collect(),
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            status: self.status,
            client_count: self.clients.len(),
        }
    }
}
