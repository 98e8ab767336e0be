//! Per-connection handler: bind to a room, pump events both ways.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Read the room hint captured from the upgrade request
//!   2. Look the room up; reject and close if it doesn't exist
//!   3. Hand the room a fresh session, starting the join handshake
//!   4. Loop: outbound events → encode → socket; socket → decode →
//!      room dispatch
//!   5. On disconnect, tell the room the client left — exactly once

use std::sync::Arc;

use parlor_protocol::{ClientEnvelope, Codec, RoomId, ServerEvent};
use parlor_room::RoomHandle;
use parlor_session::ClientSession;
use parlor_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::ParlorError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ParlorError> {
    let conn_id = conn.id();

    // A connection that doesn't say which room it wants has no use.
    let Some(hint) = conn.room_hint().map(RoomId::new) else {
        tracing::debug!(%conn_id, "connection without room hint, closing");
        let _ = conn.close().await;
        return Ok(());
    };

    let Some(room) = state.registry.room(&hint).await else {
        tracing::debug!(
            %conn_id,
            room_id = %hint,
            "connection for unknown room, rejecting"
        );
        let event =
            ServerEvent::join_failed("Could not connect to game.");
        let bytes = state.codec.encode(&event)?;
        let _ = conn.send(&bytes).await;
        let _ = conn.close().await;
        return Ok(());
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = ClientSession::new(tx);
    let client_id = session.id().clone();
    tracing::debug!(
        %conn_id,
        %client_id,
        room_id = %hint,
        "binding connection to room"
    );
    room.client_join(session).await?;

    pump(&conn, &room, &client_id, &mut rx, &state.codec).await;

    // Exactly one leave per connection, however the loop ended.
    let _ = room.client_leave(client_id).await;
    let _ = conn.close().await;
    Ok(())
}

/// Shuttles messages between the socket and the room until either side
/// goes away.
async fn pump<C: Codec>(
    conn: &WebSocketConnection,
    room: &RoomHandle,
    client_id: &parlor_protocol::ClientId,
    rx: &mut mpsc::UnboundedReceiver<ServerEvent>,
    codec: &C,
) {
    loop {
        tokio::select! {
            event = rx.recv() => {
                // None means the room dropped this session (disposed or
                // removed the client).
                let Some(event) = event else { break };
                let bytes = match codec.encode(&event) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(
                            %client_id, error = %e,
                            "failed to encode outbound event"
                        );
                        continue;
                    }
                };
                if conn.send(&bytes).await.is_err() {
                    break;
                }
            }
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::debug!(%client_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%client_id, error = %e, "recv error");
                        break;
                    }
                };
                // Malformed traffic is dropped, not fatal: one garbage
                // frame shouldn't cost the client its session.
                let envelope: ClientEnvelope = match codec.decode(&data) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        tracing::debug!(
                            %client_id, error = %e,
                            "dropping malformed envelope"
                        );
                        continue;
                    }
                };
                if room.message(client_id.clone(), envelope).await.is_err() {
                    // Room is gone; nothing left to route to.
                    break;
                }
            }
        }
    }
}
