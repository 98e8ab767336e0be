//! Error types for the room layer.

use parlor_protocol::RoomId;

use crate::HandlerKind;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this id is registered.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// A room with this id already exists in the registry.
    #[error("room {0} already registered")]
    AlreadyRegistered(RoomId),

    /// A handler was registered twice for the same name.
    ///
    /// Silently replacing a handler hides wiring bugs, so duplicate
    /// registration fails fast.
    #[error("duplicate {kind} handler for \"{name}\"")]
    DuplicateHandler {
        kind: HandlerKind,
        name: String,
    },

    /// The name is reserved for the engine's own join handshake.
    #[error("\"{0}\" is a reserved protocol name")]
    ReservedName(String),

    /// The room's command channel is closed (actor stopped or disposed).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
