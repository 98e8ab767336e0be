//! Integration tests for the Parlor server over real WebSocket clients.

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parlor::prelude::*;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Fixture room: a lobby with a turn counter.
// =========================================================================

#[derive(Default)]
struct LobbyRoom {
    turns: u32,
}

impl RoomHooks for LobbyRoom {
    fn on_create(
        &mut self,
        room: &mut RoomSetup<'_, Self>,
    ) -> impl Future<Output = Result<(), HookError>> + Send {
        let result = room.on_action(
            "nextTurnPressed",
            |r: &mut LobbyRoom, ctx, _client| {
                r.turns += 1;
                ctx.notify(StateChange::Game);
            },
        );
        async move { Ok(result?) }
    }

    fn room_state(&self, view: &RoomView) -> Value {
        json!({ "numberOfConnectedPlayers": view.client_ids.len() })
    }

    fn game_state(&self) -> Value {
        json!({ "turns": self.turns })
    }
}

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server with a "Lobby" room on a random port.
async fn start_server() -> String {
    let server = ParlorServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    server
        .registry()
        .create_room(LobbyRoom::default(), RoomOptions::with_id("Lobby"))
        .await
        .expect("room should be created");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str, room: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!(
        "ws://{addr}/?room={room}"
    ))
    .await
    .expect("should connect");
    ws
}

/// Reads server events until one with the given name arrives.
async fn expect_event(ws: &mut ClientWs, name: &str) -> Value {
    let deadline = Duration::from_secs(2);
    tokio::time::timeout(deadline, async {
        loop {
            let msg = ws
                .next()
                .await
                .expect("stream ended while waiting for event")
                .expect("websocket error");
            let event: Value =
                serde_json::from_slice(&msg.into_data()).unwrap();
            if event["e"] == name {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
}

async fn send_json(ws: &mut ClientWs, value: Value) {
    let bytes = serde_json::to_vec(&value).unwrap();
    ws.send(Message::Binary(bytes.into())).await.unwrap();
}

async fn join_lobby(addr: &str) -> ClientWs {
    let mut ws = connect(addr, "Lobby").await;
    expect_event(&mut ws, "INITIATE_JOIN").await;
    send_json(
        &mut ws,
        json!({ "t": "protocol", "m": "FINISHED_JOINING_GAME" }),
    )
    .await;
    ws
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_full_join_handshake() {
    let addr = start_server().await;
    let mut ws = join_lobby(&addr).await;

    let event = expect_event(&mut ws, "updateRoomState").await;
    assert_eq!(event["d"]["numberOfConnectedPlayers"], json!(1));
}

#[tokio::test]
async fn test_unknown_room_is_rejected() {
    let addr = start_server().await;
    let mut ws = connect(&addr, "Ghost").await;

    let event = expect_event(&mut ws, "JOIN_FAILED").await;
    assert_eq!(event["d"], json!("Could not connect to game."));

    // The server closes the connection after rejecting.
    loop {
        match ws.next().await {
            None | Some(Ok(Message::Close(_))) => break,
            Some(Ok(_)) => continue,
            Some(Err(_)) => break,
        }
    }
}

#[tokio::test]
async fn test_actions_reach_everyone() {
    let addr = start_server().await;
    let mut alice = join_lobby(&addr).await;
    expect_event(&mut alice, "updateRoomState").await;
    let mut bob = join_lobby(&addr).await;
    expect_event(&mut bob, "updateRoomState").await;

    send_json(
        &mut alice,
        json!({ "t": "game", "m": { "t": "action", "m": "nextTurnPressed" } }),
    )
    .await;

    let event = expect_event(&mut alice, "updateGameState").await;
    assert_eq!(event["d"], json!({ "turns": 1 }));
    let event = expect_event(&mut bob, "updateGameState").await;
    assert_eq!(event["d"], json!({ "turns": 1 }));
}

#[tokio::test]
async fn test_disconnect_updates_membership() {
    let addr = start_server().await;
    let mut alice = join_lobby(&addr).await;
    expect_event(&mut alice, "updateRoomState").await;
    let mut bob = join_lobby(&addr).await;
    expect_event(&mut bob, "updateRoomState").await;

    // Alice now sees two players.
    let event = expect_event(&mut alice, "updateRoomState").await;
    assert_eq!(event["d"]["numberOfConnectedPlayers"], json!(2));

    bob.close(None).await.unwrap();

    let event = expect_event(&mut alice, "updateRoomState").await;
    assert_eq!(event["d"]["numberOfConnectedPlayers"], json!(1));
}

#[tokio::test]
async fn test_malformed_frames_are_tolerated() {
    let addr = start_server().await;
    let mut ws = join_lobby(&addr).await;
    expect_event(&mut ws, "updateRoomState").await;

    // Garbage, then an unknown envelope kind; the session survives both.
    ws.send(Message::Binary(b"not json".to_vec().into()))
        .await
        .unwrap();
    send_json(&mut ws, json!({ "t": "telepathy", "m": 1 })).await;

    send_json(
        &mut ws,
        json!({ "t": "game", "m": { "t": "action", "m": "nextTurnPressed" } }),
    )
    .await;
    let event = expect_event(&mut ws, "updateGameState").await;
    assert_eq!(event["d"], json!({ "turns": 1 }));
}
