//! Room registry: creates rooms, tracks them by id, and reaps them when
//! they dispose.

use std::collections::HashMap;
use std::sync::Arc;

use parlor_protocol::RoomId;
use tokio::sync::{mpsc, Mutex};

use crate::room::spawn_room;
use crate::{RoomError, RoomHandle, RoomHooks, RoomOptions};

/// Tracks all live rooms. The entry point for room operations from the
/// connection layer and from application code (HTTP lobby endpoints,
/// admin tooling).
///
/// Cheap to clone — all clones share the same table. Removal is
/// automatic: every room gets a disposal-notification sender at spawn,
/// and a reaper task owned by the registry unregisters rooms as they
/// report disposal. There is no other way a room leaves the table, so
/// an id either resolves to a live room or to nothing.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<RoomId, RoomHandle>>>,
    disposed_tx: mpsc::UnboundedSender<RoomId>,
}

impl RoomRegistry {
    /// Creates an empty registry and spawns its reaper task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        let rooms: Arc<Mutex<HashMap<RoomId, RoomHandle>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let (disposed_tx, mut disposed_rx) = mpsc::unbounded_channel();

        let table = Arc::clone(&rooms);
        tokio::spawn(async move {
            while let Some(room_id) = disposed_rx.recv().await {
                table.lock().await.remove(&room_id);
                tracing::info!(%room_id, "room unregistered");
            }
        });

        Self { rooms, disposed_tx }
    }

    /// Spawns a new room and registers it.
    ///
    /// If `options.room_id` is set, that id is used and must be free;
    /// otherwise a random code is generated (regenerated on the off
    /// chance it collides).
    ///
    /// # Errors
    /// Returns [`RoomError::AlreadyRegistered`] if the explicit id is
    /// taken.
    pub async fn create_room<R: RoomHooks>(
        &self,
        hooks: R,
        mut options: RoomOptions,
    ) -> Result<RoomHandle, RoomError> {
        let mut rooms = self.rooms.lock().await;

        let room_id = match options.room_id.take() {
            Some(id) => {
                if rooms.contains_key(&id) {
                    return Err(RoomError::AlreadyRegistered(id));
                }
                id
            }
            None => {
                let mut id = RoomId::generate();
                while rooms.contains_key(&id) {
                    id = RoomId::generate();
                }
                id
            }
        };

        options.room_id = Some(room_id.clone());
        let handle = spawn_room(hooks, options, self.disposed_tx.clone());
        rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, "room created");
        Ok(handle)
    }

    /// Looks up a live room by id.
    pub async fn room(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.lock().await.get(room_id).cloned()
    }

    /// Ids of all live rooms.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.lock().await.keys().cloned().collect()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Asks a room to dispose. The room unregisters itself once its
    /// disposal completes.
    ///
    /// # Errors
    /// Returns [`RoomError::NotFound`] if no such room is registered.
    pub async fn dispose_room(
        &self,
        room_id: &RoomId,
    ) -> Result<(), RoomError> {
        let handle = self
            .room(room_id)
            .await
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle.dispose().await
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
