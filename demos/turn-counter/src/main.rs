//! A minimal Parlor app: one lobby room with a shared turn counter.
//!
//! Clients connect with `ws://127.0.0.1:8080/?room=Lobby`, press "next
//! turn" with `{"t":"game","m":{"t":"action","m":"nextTurnPressed"}}`,
//! and introduce themselves with
//! `{"t":"game","m":{"t":"transfer","m":{"t":"setClientName","m":"Ada"}}}`.

use std::collections::HashMap;
use std::future::Future;

use parlor::prelude::*;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TurnCounterRoom {
    turn: u32,
    names: HashMap<ClientId, String>,
}

impl RoomHooks for TurnCounterRoom {
    fn on_create(
        &mut self,
        room: &mut RoomSetup<'_, Self>,
    ) -> impl Future<Output = Result<(), HookError>> + Send {
        async move {
            room.on_action(
                "nextTurnPressed",
                |r: &mut Self, ctx, client| {
                    r.turn += 1;
                    tracing::info!(
                        client_id = %client.id(),
                        turn = r.turn,
                        "turn advanced"
                    );
                    ctx.notify(StateChange::Game);
                },
            )?;
            room.on_transfer(
                "setClientName",
                |r: &mut Self, ctx, client, data: Value| {
                    if let Some(name) = data.as_str() {
                        r.names.insert(client.id().clone(), name.into());
                        ctx.notify(StateChange::Room);
                    }
                },
            )?;
            Ok(())
        }
    }

    fn on_leave(
        &mut self,
        client: &ClientSession,
        _ctx: &mut RoomContext,
    ) -> impl Future<Output = Result<(), HookError>> + Send {
        self.names.remove(client.id());
        async { Ok(()) }
    }

    fn room_state(&self, view: &RoomView) -> Value {
        let names: Vec<&str> = view
            .client_ids
            .iter()
            .filter_map(|id| self.names.get(id).map(String::as_str))
            .collect();
        json!({
            "numberOfConnectedPlayers": view.client_ids.len(),
            "names": names,
        })
    }

    fn game_state(&self) -> Value {
        json!({ "turn": self.turn })
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let server = ParlorServerBuilder::new()
        .bind("0.0.0.0:8080")
        .build()
        .await?;

    server
        .registry()
        .create_room(
            TurnCounterRoom::default(),
            RoomOptions::with_id("Lobby"),
        )
        .await?;

    tracing::info!("turn-counter listening on 0.0.0.0:8080");
    server.run().await?;
    Ok(())
}
