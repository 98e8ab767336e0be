//! Room configuration and lifecycle state machine.

use std::time::Duration;

use parlor_protocol::RoomId;

// ---------------------------------------------------------------------------
// RoomOptions
// ---------------------------------------------------------------------------

/// Configuration for a room instance, fixed at spawn time.
#[derive(Debug, Clone)]
pub struct RoomOptions {
    /// Explicit room id. `None` means a random code is generated.
    pub room_id: Option<RoomId>,

    /// Whether the room disposes itself after sitting empty for
    /// `dispose_after`. Off by default — rooms live until explicitly
    /// disposed.
    pub auto_dispose: bool,

    /// How long an auto-disposing room may sit with no clients before
    /// it shuts down. The deadline is debounced: any join cancels it,
    /// and it re-arms fresh when the room empties again.
    pub dispose_after: Duration,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            room_id: None,
            auto_dispose: false,
            dispose_after: Duration::from_secs(300),
        }
    }
}

impl RoomOptions {
    /// Options for a room with an application-chosen id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            room_id: Some(RoomId::new(id)),
            ..Self::default()
        }
    }

    /// Enables auto-disposal with the given idle timeout.
    pub fn auto_dispose_after(mut self, after: Duration) -> Self {
        self.auto_dispose = true;
        self.dispose_after = after;
        self
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions only move forward:
///
/// ```text
/// Creating ──→ Ready ──→ Disposing
///     └──────────────────────┘
/// ```
///
/// - **Creating**: the creation hook is running. Joins and leaves that
///   arrive now are deferred, not rejected — they run, in order, the
///   moment the room becomes Ready.
/// - **Ready**: the room routes messages and accepts joins. A room
///   becomes Ready even if its creation hook failed (the failure is
///   logged); refusing service would strand clients that were already
///   told the room exists.
/// - **Disposing**: terminal. The room runs its disposal hook once and
///   unregisters itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Creating,
    Ready,
    Disposing,
}

impl RoomStatus {
    /// Returns `true` if the room is routing messages and accepting joins.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` if this is the terminal state.
    pub fn is_disposing(&self) -> bool {
        matches!(self, Self::Disposing)
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creating => write!(f, "Creating"),
            Self::Ready => write!(f, "Ready"),
            Self::Disposing => write!(f, "Disposing"),
        }
    }
}
