//! Client session layer for Parlor.
//!
//! A session is a room's record of one connected client: who they are
//! ([`parlor_protocol::ClientId`]), where they are in the join handshake
//! ([`ClientStatus`]), and how the room delivers events to them (an
//! outbound channel, with a queue that holds messages back until the
//! client has finished joining).
//!
//! Sessions are owned by the room actor that the client joined — this
//! crate has no locking and no tasks of its own.

mod session;

pub use session::{ClientSession, ClientStatus};
