//! # Parlor
//!
//! Room and session orchestration for real-time multiplayer apps.
//!
//! Applications implement the [`parlor_room::RoomHooks`] trait for each
//! kind of room they host; Parlor handles the transport, the join
//! handshake, per-client event queuing, message routing, and room
//! lifecycle (including idle auto-disposal).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! #[derive(Default)]
//! struct Lounge;
//! impl RoomHooks for Lounge {}
//!
//! # async fn demo() -> Result<(), ParlorError> {
//! let server = ParlorServer::<JsonCodec>::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server
//!     .registry()
//!     .create_room(Lounge, RoomOptions::with_id("Lobby"))
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ParlorError;
pub use server::{ParlorServer, ParlorServerBuilder};

/// The most commonly used types, re-exported in one place.
pub mod prelude {
    pub use crate::{ParlorError, ParlorServer, ParlorServerBuilder};
    pub use parlor_protocol::{
        protocol, ClientEnvelope, ClientId, GameMessage, JsonCodec,
        RoomId, ServerEvent, Transfer,
    };
    pub use parlor_room::{
        HookError, RoomContext, RoomHooks, RoomOptions, RoomRegistry,
        RoomSetup, RoomView, StateChange,
    };
    pub use parlor_session::{ClientSession, ClientStatus};
}
