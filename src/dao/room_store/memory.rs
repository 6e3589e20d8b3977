//! Process-local [`RoomStore`] backed by concurrent maps.
//!
//! Mirrors the semantics of the database backends (unique slugs, one row per
//! game-state key, unconditional upserts) so it can stand in for them in tests and
//! single-node deployments.

use std::{sync::Arc, time::SystemTime};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{BoxFuture, ready};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::{
    models::{GameStateEntity, PlayerEntity, RoomEntity},
    room_store::RoomStore,
    storage::{StorageError, StorageResult},
};

/// Process-local store; contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    rooms: DashMap<Uuid, RoomEntity>,
    slugs: DashMap<String, Uuid>,
    players: DashMap<Uuid, Vec<PlayerEntity>>,
    game_states: DashMap<(Uuid, String), GameStateEntity>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_room(&self, room: RoomEntity) -> StorageResult<()> {
        match self.inner.slugs.entry(room.slug.clone()) {
            Entry::Occupied(_) => Err(StorageError::duplicate("room slug", room.slug)),
            Entry::Vacant(slot) => {
                slot.insert(room.id);
                self.inner.rooms.insert(room.id, room);
                Ok(())
            }
        }
    }

    fn find_room_by_slug(&self, slug: &str) -> Option<RoomEntity> {
        let id = *self.inner.slugs.get(slug)?;
        self.inner.rooms.get(&id).map(|room| room.clone())
    }

    fn assign_host_if_unset(&self, room_id: Uuid, host_id: String) -> bool {
        match self.inner.rooms.get_mut(&room_id) {
            Some(mut room) if room.host_id.is_none() => {
                room.host_id = Some(host_id);
                true
            }
            _ => false,
        }
    }

    fn list_players(&self, room_id: Uuid) -> Vec<PlayerEntity> {
        let mut players = self
            .inner
            .players
            .get(&room_id)
            .map(|roster| roster.clone())
            .unwrap_or_default();
        players.sort_by_key(|player| player.order_index);
        players
    }

    fn insert_player(&self, player: PlayerEntity) {
        self.inner
            .players
            .entry(player.room_id)
            .or_default()
            .push(player);
    }

    fn find_player(&self, room_id: Uuid, player_id: Uuid) -> Option<PlayerEntity> {
        let roster = self.inner.players.get(&room_id)?;
        roster.iter().find(|player| player.id == player_id).cloned()
    }

    fn upsert_game_state(&self, room_id: Uuid, game_id: String, payload: Value) -> GameStateEntity {
        let row = GameStateEntity {
            room_id,
            game_id: game_id.clone(),
            payload,
            updated_at: SystemTime::now(),
        };
        self.inner.game_states.insert((room_id, game_id), row.clone());
        row
    }
}

impl RoomStore for MemoryRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(self.insert_room(room)))
    }

    fn find_room_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        Box::pin(ready(Ok(self.find_room_by_slug(&slug))))
    }

    fn assign_host_if_unset(
        &self,
        room_id: Uuid,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        Box::pin(ready(Ok(self.assign_host_if_unset(room_id, host_id))))
    }

    fn list_players(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        Box::pin(ready(Ok(self.list_players(room_id))))
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.insert_player(player);
        Box::pin(ready(Ok(())))
    }

    fn find_player(
        &self,
        room_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        Box::pin(ready(Ok(self.find_player(room_id, player_id))))
    }

    fn find_game_state(
        &self,
        room_id: Uuid,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let row = self
            .inner
            .game_states
            .get(&(room_id, game_id))
            .map(|row| row.clone());
        Box::pin(ready(Ok(row)))
    }

    fn upsert_game_state(
        &self,
        room_id: Uuid,
        game_id: String,
        payload: Value,
    ) -> BoxFuture<'static, StorageResult<GameStateEntity>> {
        Box::pin(ready(Ok(self.upsert_game_state(room_id, game_id, payload))))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(ready(Ok(())))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dao::models::RoomSettingsEntity;

    fn room(slug: &str) -> RoomEntity {
        RoomEntity {
            id: Uuid::new_v4(),
            slug: slug.into(),
            host_id: None,
            password_hash: None,
            settings: RoomSettingsEntity {
                max_players: 12,
                selected_game: None,
                script_room: None,
            },
            created_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let store = MemoryRoomStore::new();
        RoomStore::insert_room(&store, room("abcd1234")).await.unwrap();

        let err = RoomStore::insert_room(&store, room("abcd1234"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn upsert_replaces_payload_without_merging() {
        let store = MemoryRoomStore::new();
        let room_id = Uuid::new_v4();

        RoomStore::upsert_game_state(&store, room_id, "quiz".into(), json!({"a": 1, "b": 2}))
            .await
            .unwrap();
        RoomStore::upsert_game_state(&store, room_id, "quiz".into(), json!({"c": 3}))
            .await
            .unwrap();

        let row = RoomStore::find_game_state(&store, room_id, "quiz".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.payload, json!({"c": 3}));
        assert_eq!(store.inner.game_states.len(), 1);
    }

    #[tokio::test]
    async fn host_is_assigned_once() {
        let store = MemoryRoomStore::new();
        let room = room("host0001");
        let room_id = room.id;
        RoomStore::insert_room(&store, room).await.unwrap();

        assert!(
            RoomStore::assign_host_if_unset(&store, room_id, "first".into())
                .await
                .unwrap()
        );
        assert!(
            !RoomStore::assign_host_if_unset(&store, room_id, "second".into())
                .await
                .unwrap()
        );

        let stored = store.find_room_by_slug("host0001").unwrap();
        assert_eq!(stored.host_id.as_deref(), Some("first"));
    }
}
