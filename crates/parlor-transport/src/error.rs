//! Error types for the transport layer.
//!
//! Every variant carries the underlying failure: an I/O error for the
//! socket operations, or the handshake's own message when a client's
//! upgrade request is unusable.

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener or accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The connection was accepted but its protocol upgrade (the
    /// WebSocket handshake) did not complete.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// Sending data over an established connection failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data over an established connection failed. A clean
    /// close is not an error; `Connection::recv` reports it as `None`.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_failure_carries_the_reason() {
        let err = TransportError::HandshakeFailed("bad upgrade".into());
        assert_eq!(err.to_string(), "handshake failed: bad upgrade");
    }

    #[test]
    fn test_io_variants_expose_a_source() {
        use std::error::Error;
        let err = TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe",
        ));
        assert!(err.source().is_some());
    }
}
