//! Error types for the protocol layer.
//!
//! Each crate in Parlor defines its own error enum. When you see a
//! `ProtocolError`, the problem is in serialization/deserialization, not
//! in networking or room management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown envelope tag, missing
    /// fields, or truncated messages.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is invalid at the protocol level.
    ///
    /// For logical errors that pass deserialization but violate protocol
    /// rules — e.g. an empty transfer channel name.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
