//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The protocol layer doesn't care HOW messages are serialized — it just
//! needs something that implements the [`Codec`] trait, so the wire format
//! can be swapped without touching the engine or transport.
//!
//! Currently we provide [`JsonCodec`] (human-readable, great for debugging
//! in browser DevTools). A compact binary codec could be added later
//! without changing any other code.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because codecs are held by connection handler
/// tasks that Tokio may run on any thread. The methods are generic over
/// the message type: the same codec encodes [`crate::ServerEvent`]s going
/// out and decodes [`crate::ClientEnvelope`]s coming in.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the decoded value
/// doesn't borrow from the input bytes — the receive buffer can be dropped
/// or reused immediately after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is the format the client SDKs speak, and it keeps every message
/// inspectable in logs and DevTools. The tradeoff is size; a binary codec
/// would be the production upgrade path.
///
/// ## Example
///
/// ```rust
/// use parlor_protocol::{ClientEnvelope, Codec, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let bytes = br#"{"t":"protocol","m":"FINISHED_JOINING_GAME"}"#;
/// let envelope: ClientEnvelope = codec.decode(bytes).unwrap();
/// assert_eq!(
///     envelope,
///     ClientEnvelope::Protocol("FINISHED_JOINING_GAME".into())
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
