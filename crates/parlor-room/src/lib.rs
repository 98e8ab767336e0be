//! Room engine for Parlor.
//!
//! A room is an isolated Tokio task that owns one session of a real-time
//! application: its member clients, its application state, and its
//! lifecycle. The outside world talks to a room only through its
//! [`RoomHandle`] — no shared mutable state, just message passing.
//!
//! The pieces:
//!
//! - [`RoomHooks`] — the extension point applications implement
//!   (`on_create`, `on_auth`, `on_join`, `on_joined`, `on_leave`,
//!   `on_dispose`, plus the state views broadcast to clients).
//! - [`RoomContext`] — what hooks and handlers are handed to act on the
//!   room (send, broadcast, state-change notifications, disposal).
//! - [`HandlerRegistry`] — string-keyed routing for protocol, action,
//!   and transfer messages.
//! - [`spawn_room`] / [`RoomHandle`] — the actor and its handle.
//! - [`RoomRegistry`] — tracks live rooms by id and reaps disposed ones.

mod config;
mod context;
mod error;
mod handlers;
mod hooks;
mod registry;
mod room;

pub use config::{RoomOptions, RoomStatus};
pub use context::{RoomContext, StateChange};
pub use error::RoomError;
pub use handlers::{HandlerKind, HandlerRegistry};
pub use hooks::{HookError, RoomHooks, RoomSetup, RoomView};
pub use registry::RoomRegistry;
pub use room::{spawn_room, RoomHandle, RoomInfo};
