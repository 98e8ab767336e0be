//! Wire protocol for Parlor.
//!
//! This crate defines the "language" that clients and rooms speak:
//!
//! - **Types** ([`ClientEnvelope`], [`GameMessage`], [`ServerEvent`], the
//!   identifier newtypes) — the structures that travel on the wire.
//! - **Reserved names** ([`protocol`]) — the event and protocol-message
//!   strings the engine itself handles during the join handshake.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Identifiers** ([`ids`]) — random room codes and client ids.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! engine. It doesn't know about connections or rooms — it only knows how
//! to name things and (de)serialize messages.

mod codec;
mod error;
pub mod ids;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    protocol, ClientEnvelope, ClientId, GameMessage, RoomId, ServerEvent,
    Transfer,
};
