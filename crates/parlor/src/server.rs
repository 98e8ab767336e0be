//! `ParlorServer` builder and accept loop.
//!
//! This is the entry point for running a Parlor server. It ties the
//! layers together: transport → protocol → session → room. Rooms are
//! created through the server's [`RoomRegistry`] (usually before `run`,
//! or at any point from another task holding a registry clone).

use std::sync::Arc;

use parlor_protocol::{Codec, JsonCodec};
use parlor_room::RoomRegistry;
use parlor_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::ParlorError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: RoomRegistry,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,ignore
/// use parlor::prelude::*;
///
/// let server = ParlorServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server
///     .registry()
///     .create_room(MyRoom::default(), RoomOptions::with_id("Lobby"))
///     .await?;
/// server.run().await
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build(
        self,
    ) -> Result<ParlorServer<JsonCodec>, ParlorError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        Ok(ParlorServer {
            transport,
            registry: RoomRegistry::new(),
            codec: JsonCodec,
        })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Parlor server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer<C: Codec + Clone> {
    transport: WebSocketTransport,
    registry: RoomRegistry,
    codec: C,
}

impl<C: Codec + Clone> ParlorServer<C> {
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }

    /// The room registry backing this server. Clone it to create and
    /// manage rooms from anywhere.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(
        &self,
    ) -> Result<std::net::SocketAddr, ParlorError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        tracing::info!("Parlor server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::new(ServerState {
                        registry: self.registry.clone(),
                        codec: self.codec.clone(),
                    });
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
