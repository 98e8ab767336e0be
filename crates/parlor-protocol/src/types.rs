//! Core protocol types for Parlor's wire format.
//!
//! Every message a client sends to a room travels as a [`ClientEnvelope`];
//! every message a room sends back is a [`ServerEvent`]. The envelope is a
//! closed tagged union — malformed shapes fail at decode instead of being
//! silently carried around as untyped payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A room's stable identifier, assigned at creation and immutable after.
///
/// Room ids are short, human-shareable codes ("K7Q2F") so players can join a
/// friend's room by typing it in. Applications may also pick their own ids
/// ("Lobby"). `#[serde(transparent)]` serializes this as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps an application-chosen identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random 5-character uppercase room code.
    pub fn generate() -> Self {
        Self(ids::room_code(5))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A client session's unique identifier.
///
/// Generated per connection, never reused. Same newtype pattern as
/// [`RoomId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wraps an externally supplied identifier (tests, fixtures).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random client id.
    pub fn generate() -> Self {
        Self(ids::client_id())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Reserved names
// ---------------------------------------------------------------------------

/// Protocol strings and event names the engine handles itself.
///
/// Everything not listed here is application-defined.
pub mod protocol {
    /// Client → room: "my client-side join procedures succeeded."
    pub const FINISHED_JOINING_GAME: &str = "FINISHED_JOINING_GAME";
    /// Client → room: "my client-side join procedures failed."
    pub const FAILED_JOINING_GAME: &str = "FAILED_JOINING_GAME";

    /// Room → client: "authentication passed, run your join procedures."
    pub const INITIATE_JOIN: &str = "INITIATE_JOIN";
    /// Room → client: "you could not be joined" (carries a string reason).
    pub const JOIN_FAILED: &str = "JOIN_FAILED";

    /// Room → client: broadcast of the application's room-level state.
    pub const UPDATE_ROOM_STATE: &str = "updateRoomState";
    /// Room → client: broadcast of the application's game-level state.
    pub const UPDATE_GAME_STATE: &str = "updateGameState";
}

// ---------------------------------------------------------------------------
// Client → room envelope
// ---------------------------------------------------------------------------

/// The top-level wire shape of every client → room message.
///
/// Adjacently tagged as `{ "t": <kind>, "m": <payload> }`:
///
/// ```text
/// { "t": "protocol", "m": "FINISHED_JOINING_GAME" }
/// { "t": "game",     "m": { "t": "action",   "m": "nextTurnPressed" } }
/// { "t": "game",     "m": { "t": "transfer", "m": { "t": "setClientName", "m": "Alice" } } }
/// { "t": "ack",      "m": 7 }
/// ```
///
/// The three namespaces are intentional: protocol messages govern the
/// connection lifecycle, actions are parameterless triggers, transfers carry
/// a payload on a named channel. Keeping them separate prevents application
/// names from colliding with lifecycle signaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "m", rename_all = "lowercase")]
pub enum ClientEnvelope {
    /// A flat protocol string, dispatched to a protocol handler (or the
    /// engine, for the reserved join-completion signals).
    Protocol(String),
    /// An application-level message: action or transfer.
    Game(GameMessage),
    /// A structured acknowledgment of a server event that requested one.
    Ack(u64),
}

/// The nested payload of a `game` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "m", rename_all = "lowercase")]
pub enum GameMessage {
    /// A fire-and-forget trigger; the payload is the action's name.
    Action(String),
    /// A named channel carrying an arbitrary JSON payload.
    Transfer(Transfer),
}

/// The innermost `{ "t": <channel>, "m": <payload> }` of a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// The transfer channel name.
    #[serde(rename = "t")]
    pub name: String,
    /// The payload; shape is up to the application handler.
    #[serde(rename = "m")]
    pub data: Value,
}

// ---------------------------------------------------------------------------
// Room → client events
// ---------------------------------------------------------------------------

/// A named event sent from a room to a client.
///
/// The transport contract is "named events with a payload", so this is a
/// name plus JSON data rather than a closed enum — the engine reserves a
/// handful of names ([`protocol`]) and applications use the rest freely.
///
/// Serialized as `{ "e": <name>, "d": <data>, "ack": <id> }`, with `d`
/// omitted when null and `ack` omitted unless the room wants a structured
/// acknowledgment back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    /// The event name.
    #[serde(rename = "e")]
    pub name: String,
    /// The event payload.
    #[serde(rename = "d", default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    /// Correlation id for a structured acknowledgment, if requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

impl ServerEvent {
    /// Creates a named event with a payload.
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            ack: None,
        }
    }

    /// Creates a payloadless named event.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Value::Null)
    }

    /// The `INITIATE_JOIN` signal.
    pub fn initiate_join() -> Self {
        Self::named(protocol::INITIATE_JOIN)
    }

    /// The `JOIN_FAILED` signal with a reason.
    pub fn join_failed(reason: impl Into<String>) -> Self {
        Self::new(protocol::JOIN_FAILED, Value::String(reason.into()))
    }

    /// Attaches an acknowledgment correlation id.
    pub fn with_ack(mut self, id: u64) -> Self {
        self.ack = Some(id);
        self
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is a contract with client SDKs, so these tests pin
    //! exact JSON shapes, not just round-trips.

    use serde_json::json;

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::new("Lobby")).unwrap();
        assert_eq!(json, "\"Lobby\"");
    }

    #[test]
    fn test_room_id_generate_is_five_uppercase_chars() {
        let id = RoomId::generate();
        assert_eq!(id.as_str().len(), 5);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_client_id_generate_is_unique() {
        assert_ne!(ClientId::generate(), ClientId::generate());
    }

    #[test]
    fn test_client_id_display() {
        assert_eq!(ClientId::new("abc").to_string(), "abc");
    }

    // =====================================================================
    // ClientEnvelope — the three wire shapes from the protocol contract
    // =====================================================================

    #[test]
    fn test_protocol_envelope_json_shape() {
        let env = ClientEnvelope::Protocol("FINISHED_JOINING_GAME".into());
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({ "t": "protocol", "m": "FINISHED_JOINING_GAME" })
        );
    }

    #[test]
    fn test_action_envelope_json_shape() {
        let env = ClientEnvelope::Game(GameMessage::Action(
            "nextTurnPressed".into(),
        ));
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({ "t": "game", "m": { "t": "action", "m": "nextTurnPressed" } })
        );
    }

    #[test]
    fn test_transfer_envelope_json_shape() {
        let env = ClientEnvelope::Game(GameMessage::Transfer(Transfer {
            name: "setClientName".into(),
            data: json!("Alice"),
        }));
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({
                "t": "game",
                "m": { "t": "transfer", "m": { "t": "setClientName", "m": "Alice" } }
            })
        );
    }

    #[test]
    fn test_ack_envelope_json_shape() {
        let env = ClientEnvelope::Ack(7);
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value, json!({ "t": "ack", "m": 7 }));
    }

    #[test]
    fn test_transfer_envelope_decodes_from_wire_json() {
        let env: ClientEnvelope = serde_json::from_str(
            r#"{"t":"game","m":{"t":"transfer","m":{"t":"setClientName","m":"Alice"}}}"#,
        )
        .unwrap();
        match env {
            ClientEnvelope::Game(GameMessage::Transfer(t)) => {
                assert_eq!(t.name, "setClientName");
                assert_eq!(t.data, json!("Alice"));
            }
            other => panic!("expected transfer, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_envelope_is_rejected() {
        // Unknown kind tag — rejected at decode, not silently ignored.
        let result: Result<ClientEnvelope, _> =
            serde_json::from_str(r#"{"t":"telepathy","m":"hello"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_envelope_missing_payload_is_rejected() {
        let result: Result<ClientEnvelope, _> =
            serde_json::from_str(r#"{"t":"protocol"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result: Result<ClientEnvelope, _> =
            serde_json::from_slice(b"not json at all");
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_server_event_payloadless_omits_data() {
        let value = serde_json::to_value(ServerEvent::initiate_join()).unwrap();
        assert_eq!(value, json!({ "e": "INITIATE_JOIN" }));
    }

    #[test]
    fn test_server_event_join_failed_carries_reason() {
        let value = serde_json::to_value(ServerEvent::join_failed(
            "Could not connect to game.",
        ))
        .unwrap();
        assert_eq!(
            value,
            json!({ "e": "JOIN_FAILED", "d": "Could not connect to game." })
        );
    }

    #[test]
    fn test_server_event_with_ack_round_trip() {
        let event = ServerEvent::new("updateRoomState", json!({ "n": 2 }))
            .with_ack(3);
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
        assert_eq!(decoded.ack, Some(3));
    }

    #[test]
    fn test_server_event_data_defaults_to_null() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"e":"INITIATE_JOIN"}"#).unwrap();
        assert_eq!(event.name, "INITIATE_JOIN");
        assert!(event.data.is_null());
        assert_eq!(event.ack, None);
    }
}
