//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Accepts upgrades with a header callback so the upgrade request's
//! query string survives the handshake — that's where a client says
//! which room it wants (`ws://host/?room=K7Q2F`).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::handshake::server::{
    Request, Response,
};
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// The address the listener is actually bound to (useful when
    /// binding to port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(TransportError::AcceptFailed)
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // The upgrade request is only visible during the handshake, so
        // the room hint has to be plucked out here.
        let mut room_hint = None;
        let callback = |req: &Request, resp: Response| {
            room_hint = query_param(req.uri().query(), "room");
            Ok(resp)
        };

        let ws = tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .map_err(|e| TransportError::HandshakeFailed(e.to_string()))?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, room = ?room_hint, "accepted WebSocket connection");

        Ok(WebSocketConnection {
            id,
            room_hint,
            ws: Arc::new(Mutex::new(ws)),
        })
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Extracts a single query parameter from a raw query string.
///
/// The value is percent-decoded, so a room id with encoded characters
/// (`room=My%20Room`) matches its registry entry.
fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| {
            percent_encoding::percent_decode_str(v)
                .decode_utf8()
                .ok()
                .map(|v| v.into_owned())
        })
        .filter(|v| !v.is_empty())
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    room_hint: Option<String>,
    ws: Arc<Mutex<WsStream>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        let msg = Message::Binary(data.to_vec().into());
        self.ws.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        use futures_util::StreamExt;
        loop {
            let msg = self.ws.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.ws.lock().await.close(None).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn room_hint(&self) -> Option<&str> {
        self.room_hint.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_finds_room() {
        assert_eq!(
            query_param(Some("room=K7Q2F"), "room"),
            Some("K7Q2F".into())
        );
        assert_eq!(
            query_param(Some("token=abc&room=Lobby"), "room"),
            Some("Lobby".into())
        );
    }

    #[test]
    fn test_query_param_missing_or_empty() {
        assert_eq!(query_param(None, "room"), None);
        assert_eq!(query_param(Some("token=abc"), "room"), None);
        assert_eq!(query_param(Some("room="), "room"), None);
        assert_eq!(query_param(Some("room"), "room"), None);
    }

    #[test]
    fn test_query_param_percent_decodes_the_value() {
        assert_eq!(
            query_param(Some("room=My%20Room"), "room"),
            Some("My Room".into())
        );
        assert_eq!(
            query_param(Some("room=%F0%9F%8E%B2"), "room"),
            Some("🎲".into())
        );
        // Invalid UTF-8 after decoding is treated as no hint.
        assert_eq!(query_param(Some("room=%FF"), "room"), None);
    }
}
