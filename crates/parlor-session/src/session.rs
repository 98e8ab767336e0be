//! Session types: the data structures that represent a client's
//! connection to a room.
//!
//! A session tracks:
//! - WHO the client is (`ClientId`)
//! - WHERE they are in the join handshake (`ClientStatus`)
//! - HOW the room reaches them (an outbound event channel)
//! - WHAT is waiting for them (events queued until the join completes)

use std::collections::VecDeque;

use parlor_protocol::{ClientId, ServerEvent};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// ClientStatus
// ---------------------------------------------------------------------------

/// Where a client is in its lifecycle with a room.
///
/// ```text
///   Joining ──(auth denied)──→ Rejected
///      │
///      ├──(FINISHED_JOINING_GAME)──→ Joined ──(disconnect)──→ Leaving
///      │                                │
///      │                          (reconnecting)
///      │                                ↓
///      └────────────────────────── Reconnecting
/// ```
///
/// - **Joining**: the handshake has begun; outbound events are queued.
/// - **Joined**: the handshake completed; events flow directly.
/// - **Reconnecting**: the client dropped but the application asked the
///   room to hold its place.
/// - **Leaving**: the client is being removed; set during `on_leave`.
/// - **Rejected**: authentication denied; the session exists but is never
///   routed to or from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    Joining,
    Joined,
    Reconnecting,
    Leaving,
    Rejected,
}

impl ClientStatus {
    /// Whether events should be delivered immediately instead of queued.
    pub fn delivers_directly(self) -> bool {
        matches!(self, Self::Joined)
    }

    /// Whether inbound messages from this client should be routed at all.
    pub fn accepts_messages(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Joining => "joining",
            Self::Joined => "joined",
            Self::Reconnecting => "reconnecting",
            Self::Leaving => "leaving",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ClientSession
// ---------------------------------------------------------------------------

/// One client's session with a room.
///
/// The session queues outbound events until the client reports that its
/// own join procedures finished. Without the queue, state broadcasts that
/// happen while the client is still setting up (e.g. another player's
/// move during the handshake) would arrive before the client is able to
/// process them and be lost.
///
/// The two join-handshake signals (`INITIATE_JOIN`, `JOIN_FAILED`) bypass
/// the queue via [`send_now`](Self::send_now) — they ARE the handshake, so
/// holding them back would deadlock it.
#[derive(Debug)]
pub struct ClientSession {
    id: ClientId,
    status: ClientStatus,
    queue: VecDeque<ServerEvent>,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ClientSession {
    /// Creates a session with a fresh random id.
    ///
    /// `sender` is the channel the connection handler drains to push
    /// events over the transport.
    pub fn new(sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self::with_id(ClientId::generate(), sender)
    }

    /// Creates a session with an explicit id (tests, reconnection).
    pub fn with_id(
        id: ClientId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Self {
        Self {
            id,
            status: ClientStatus::Joining,
            queue: VecDeque::new(),
            sender,
        }
    }

    /// The client's unique id.
    pub fn id(&self) -> &ClientId {
        &self.id
    }

    /// The client's current lifecycle status.
    pub fn status(&self) -> ClientStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ClientStatus) {
        self.status = status;
    }

    /// Number of events waiting in the pre-join queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Sends an event to the client, queuing it if the join handshake
    /// hasn't completed yet.
    pub fn send(&mut self, event: ServerEvent) {
        if self.status.delivers_directly() {
            self.deliver(event);
        } else {
            tracing::trace!(
                client_id = %self.id,
                event = %event.name,
                "queued event for joining client"
            );
            self.queue.push_back(event);
        }
    }

    /// Sends an event immediately, bypassing the queue.
    ///
    /// Only for the handshake signals themselves.
    pub fn send_now(&self, event: ServerEvent) {
        self.deliver(event);
    }

    /// Delivers every queued event in the order it was queued.
    ///
    /// Called once, when the client transitions to [`ClientStatus::Joined`].
    pub fn flush(&mut self) {
        if !self.queue.is_empty() {
            tracing::debug!(
                client_id = %self.id,
                count = self.queue.len(),
                "flushing queued events"
            );
        }
        while let Some(event) = self.queue.pop_front() {
            self.deliver(event);
        }
    }

    /// Pushes an event onto the outbound channel. Silently drops if the
    /// connection handler is gone (client disconnected).
    fn deliver(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use parlor_protocol::protocol;

    use super::*;

    fn session() -> (ClientSession, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientSession::new(tx), rx)
    }

    #[test]
    fn test_events_queue_while_joining() {
        let (mut session, mut rx) = session();
        session.send(ServerEvent::named("a"));
        session.send(ServerEvent::named("b"));

        assert_eq!(session.queued(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_flush_delivers_in_fifo_order() {
        let (mut session, mut rx) = session();
        session.send(ServerEvent::named("first"));
        session.send(ServerEvent::named("second"));

        session.set_status(ClientStatus::Joined);
        session.flush();

        assert_eq!(rx.try_recv().unwrap().name, "first");
        assert_eq!(rx.try_recv().unwrap().name, "second");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_joined_client_receives_directly() {
        let (mut session, mut rx) = session();
        session.set_status(ClientStatus::Joined);

        session.send(ServerEvent::named("direct"));

        assert_eq!(session.queued(), 0);
        assert_eq!(rx.try_recv().unwrap().name, "direct");
    }

    #[test]
    fn test_send_now_bypasses_queue() {
        let (session, mut rx) = session();

        session.send_now(ServerEvent::initiate_join());

        assert_eq!(rx.try_recv().unwrap().name, protocol::INITIATE_JOIN);
    }

    #[test]
    fn test_send_after_flush_is_direct() {
        let (mut session, mut rx) = session();
        session.send(ServerEvent::named("queued"));
        session.set_status(ClientStatus::Joined);
        session.flush();
        session.send(ServerEvent::named("live"));

        assert_eq!(rx.try_recv().unwrap().name, "queued");
        assert_eq!(rx.try_recv().unwrap().name, "live");
    }

    #[test]
    fn test_send_to_dropped_receiver_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut session = ClientSession::new(tx);
        session.set_status(ClientStatus::Joined);
        drop(rx);

        session.send(ServerEvent::named("gone"));
    }

    #[test]
    fn test_status_helpers() {
        assert!(ClientStatus::Joined.delivers_directly());
        assert!(!ClientStatus::Joining.delivers_directly());
        assert!(!ClientStatus::Rejected.accepts_messages());
        assert!(ClientStatus::Joining.accepts_messages());
    }
}
