//! String-keyed message routing and ack correlation.
//!
//! A room routes three namespaces of inbound messages — protocol strings,
//! actions, and transfers — each to handlers registered by name during
//! the room's creation hook. Names the engine reserves for the join
//! handshake cannot be registered; duplicate registration fails fast.
//! Inbound names with no handler are ignored, so old servers tolerate
//! newer clients.

use std::collections::HashMap;

use parlor_protocol::protocol;
use parlor_session::ClientSession;
use serde_json::Value;

use crate::{RoomContext, RoomError};

/// A handler for a protocol string or an action (no payload).
pub type MessageHandler<R> =
    Box<dyn FnMut(&mut R, &mut RoomContext, &ClientSession) + Send>;

/// A handler for a transfer (carries the transfer's JSON payload).
pub type TransferHandler<R> =
    Box<dyn FnMut(&mut R, &mut RoomContext, &ClientSession, Value) + Send>;

/// The three handler namespaces, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Protocol,
    Action,
    Transfer,
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protocol => write!(f, "protocol"),
            Self::Action => write!(f, "action"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

/// Protocol names the engine consumes itself; apps can't claim them.
const RESERVED: &[&str] = &[
    protocol::FINISHED_JOINING_GAME,
    protocol::FAILED_JOINING_GAME,
];

/// Per-room handler tables. Owned by the room actor; registration
/// happens through [`crate::RoomSetup`] inside the creation hook.
pub struct HandlerRegistry<R> {
    protocol: HashMap<String, MessageHandler<R>>,
    action: HashMap<String, MessageHandler<R>>,
    transfer: HashMap<String, TransferHandler<R>>,
}

impl<R> HandlerRegistry<R> {
    pub(crate) fn new() -> Self {
        Self {
            protocol: HashMap::new(),
            action: HashMap::new(),
            transfer: HashMap::new(),
        }
    }

    pub(crate) fn register_protocol(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&mut R, &mut RoomContext, &ClientSession)
            + Send
            + 'static,
    ) -> Result<(), RoomError> {
        let name = name.into();
        if RESERVED.contains(&name.as_str()) {
            return Err(RoomError::ReservedName(name));
        }
        if self.protocol.contains_key(&name) {
            return Err(RoomError::DuplicateHandler {
                kind: HandlerKind::Protocol,
                name,
            });
        }
        self.protocol.insert(name, Box::new(handler));
        Ok(())
    }

    pub(crate) fn register_action(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&mut R, &mut RoomContext, &ClientSession)
            + Send
            + 'static,
    ) -> Result<(), RoomError> {
        let name = name.into();
        if self.action.contains_key(&name) {
            return Err(RoomError::DuplicateHandler {
                kind: HandlerKind::Action,
                name,
            });
        }
        self.action.insert(name, Box::new(handler));
        Ok(())
    }

    pub(crate) fn register_transfer(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&mut R, &mut RoomContext, &ClientSession, Value)
            + Send
            + 'static,
    ) -> Result<(), RoomError> {
        let name = name.into();
        if self.transfer.contains_key(&name) {
            return Err(RoomError::DuplicateHandler {
                kind: HandlerKind::Transfer,
                name,
            });
        }
        self.transfer.insert(name, Box::new(handler));
        Ok(())
    }

    pub(crate) fn protocol_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut MessageHandler<R>> {
        self.protocol.get_mut(name)
    }

    pub(crate) fn action_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut MessageHandler<R>> {
        self.action.get_mut(name)
    }

    pub(crate) fn transfer_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut TransferHandler<R>> {
        self.transfer.get_mut(name)
    }
}

// ---------------------------------------------------------------------------
// AckRegistry
// ---------------------------------------------------------------------------

/// Maps outstanding ack correlation ids to the protocol handler that
/// should run when the client echoes the id back.
///
/// Ids are allocated per room and never reused; each one fires at most
/// once.
#[derive(Debug, Default)]
pub(crate) struct AckRegistry {
    next: u64,
    pending: HashMap<u64, String>,
}

impl AckRegistry {
    /// Allocates a fresh correlation id bound to a handler name.
    pub(crate) fn register(&mut self, on_ack: String) -> u64 {
        self.next += 1;
        let id = self.next;
        self.pending.insert(id, on_ack);
        id
    }

    /// Resolves an echoed id, at most once.
    pub(crate) fn take(&mut self, id: u64) -> Option<String> {
        self.pending.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;

    #[test]
    fn test_duplicate_protocol_handler_is_rejected() {
        let mut registry = HandlerRegistry::<Nothing>::new();
        registry
            .register_protocol("hello", |_, _, _| {})
            .unwrap();

        let err = registry
            .register_protocol("hello", |_, _, _| {})
            .unwrap_err();
        assert!(matches!(
            err,
            RoomError::DuplicateHandler {
                kind: HandlerKind::Protocol,
                ..
            }
        ));
    }

    #[test]
    fn test_reserved_protocol_names_are_rejected() {
        let mut registry = HandlerRegistry::<Nothing>::new();
        let err = registry
            .register_protocol(protocol::FINISHED_JOINING_GAME, |_, _, _| {})
            .unwrap_err();
        assert!(matches!(err, RoomError::ReservedName(_)));
    }

    #[test]
    fn test_same_name_allowed_across_namespaces() {
        let mut registry = HandlerRegistry::<Nothing>::new();
        registry.register_action("ping", |_, _, _| {}).unwrap();
        registry
            .register_transfer("ping", |_, _, _, _| {})
            .unwrap();
        registry.register_protocol("ping", |_, _, _| {}).unwrap();
    }

    #[test]
    fn test_ack_ids_fire_at_most_once() {
        let mut acks = AckRegistry::default();
        let id = acks.register("confirmed".into());

        assert_eq!(acks.take(id), Some("confirmed".into()));
        assert_eq!(acks.take(id), None);
    }

    #[test]
    fn test_ack_ids_are_unique() {
        let mut acks = AckRegistry::default();
        let a = acks.register("x".into());
        let b = acks.register("y".into());
        assert_ne!(a, b);
    }

    #[test]
    fn test_unknown_ack_id_is_none() {
        let mut acks = AckRegistry::default();
        assert_eq!(acks.take(99), None);
    }
}
