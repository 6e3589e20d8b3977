//! [`RoomStore`](crate::dao::room_store::RoomStore) over MongoDB.

use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, doc},
};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::{
        GAME_STATE_COLLECTION, PLAYER_COLLECTION, ROOM_COLLECTION, ensure_indexes,
        establish_connection,
    },
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{MongoGameStateDocument, MongoPlayerDocument, MongoRoomDocument},
};
use crate::dao::{
    models::{GameStateEntity, PlayerEntity, RoomEntity},
    room_store::RoomStore,
    storage::StorageResult,
};

/// Store backed by the `rooms`, `room_players` and `game_states` collections.
#[derive(Clone)]
pub struct MongoRoomStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        info!(database = %self.config.database_name, "MongoDB connection re-established");
        Ok(())
    }
}

impl MongoRoomStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;
        ensure_indexes(&database).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn insert_room(&self, room: RoomEntity) -> MongoResult<()> {
        let slug = room.slug.clone();
        let document: MongoRoomDocument = room.into();
        let collection = self.collection::<MongoRoomDocument>(ROOM_COLLECTION).await;

        collection.insert_one(&document).await.map_err(|source| {
            if is_duplicate_key(&source) {
                MongoDaoError::DuplicateSlug { slug: slug.clone() }
            } else {
                MongoDaoError::SaveRoom { slug: slug.clone(), source }
            }
        })?;
        Ok(())
    }

    async fn find_room_by_slug(&self, slug: String) -> MongoResult<Option<RoomEntity>> {
        let collection = self.collection::<MongoRoomDocument>(ROOM_COLLECTION).await;
        let document = collection
            .find_one(doc! { "slug": slug.as_str() })
            .await
            .map_err(|source| MongoDaoError::LoadRoom { slug, source })?;

        document.map(RoomEntity::try_from).transpose()
    }

    async fn assign_host_if_unset(&self, room_id: Uuid, host_id: String) -> MongoResult<bool> {
        let collection = self.collection::<MongoRoomDocument>(ROOM_COLLECTION).await;
        let result = collection
            .update_one(
                doc! { "_id": room_id.to_string(), "host_id": null },
                doc! { "$set": { "host_id": host_id } },
            )
            .await
            .map_err(|source| MongoDaoError::AssignHost {
                id: room_id,
                source,
            })?;

        Ok(result.modified_count > 0)
    }

    async fn list_players(&self, room_id: Uuid) -> MongoResult<Vec<PlayerEntity>> {
        let collection = self
            .collection::<MongoPlayerDocument>(PLAYER_COLLECTION)
            .await;
        let documents: Vec<MongoPlayerDocument> = collection
            .find(doc! { "room_id": room_id.to_string() })
            .sort(doc! { "order_index": 1 })
            .await
            .map_err(|source| MongoDaoError::LoadPlayers { room_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadPlayers { room_id, source })?;

        documents.into_iter().map(PlayerEntity::try_from).collect()
    }

    async fn insert_player(&self, player: PlayerEntity) -> MongoResult<()> {
        let id = player.id;
        let document: MongoPlayerDocument = player.into();
        let collection = self
            .collection::<MongoPlayerDocument>(PLAYER_COLLECTION)
            .await;

        collection
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SavePlayer { id, source })?;
        Ok(())
    }

    async fn find_player(&self, room_id: Uuid, player_id: Uuid) -> MongoResult<Option<PlayerEntity>> {
        let collection = self
            .collection::<MongoPlayerDocument>(PLAYER_COLLECTION)
            .await;
        let document = collection
            .find_one(doc! { "_id": player_id.to_string(), "room_id": room_id.to_string() })
            .await
            .map_err(|source| MongoDaoError::LoadPlayers { room_id, source })?;

        document.map(PlayerEntity::try_from).transpose()
    }

    async fn find_game_state(
        &self,
        room_id: Uuid,
        game_id: String,
    ) -> MongoResult<Option<GameStateEntity>> {
        let collection = self
            .collection::<MongoGameStateDocument>(GAME_STATE_COLLECTION)
            .await;
        let document = collection
            .find_one(doc! { "room_id": room_id.to_string(), "game_id": game_id.as_str() })
            .await
            .map_err(|source| MongoDaoError::LoadGameState {
                room_id,
                game_id,
                source,
            })?;

        document.map(GameStateEntity::try_from).transpose()
    }

    /// Replace the whole row for the composite key, creating it when absent.
    async fn upsert_game_state(
        &self,
        room_id: Uuid,
        game_id: String,
        payload: Value,
    ) -> MongoResult<GameStateEntity> {
        let updated_at = DateTime::now();
        let document = MongoGameStateDocument {
            room_id: room_id.to_string(),
            game_id: game_id.clone(),
            payload: payload.to_string(),
            updated_at,
        };
        let collection = self
            .collection::<MongoGameStateDocument>(GAME_STATE_COLLECTION)
            .await;

        collection
            .replace_one(
                doc! { "room_id": room_id.to_string(), "game_id": game_id.as_str() },
                &document,
            )
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGameState {
                room_id,
                game_id: game_id.clone(),
                source,
            })?;

        Ok(GameStateEntity {
            room_id,
            game_id,
            payload,
            updated_at: updated_at.to_system_time(),
        })
    }
}

impl RoomStore for MongoRoomStore {
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_room(room).await.map_err(Into::into) })
    }

    fn find_room_by_slug(
        &self,
        slug: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_room_by_slug(slug).await.map_err(Into::into) })
    }

    fn assign_host_if_unset(
        &self,
        room_id: Uuid,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .assign_host_if_unset(room_id, host_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_players(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_players(room_id).await.map_err(Into::into) })
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_player(player).await.map_err(Into::into) })
    }

    fn find_player(
        &self,
        room_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_player(room_id, player_id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_game_state(
        &self,
        room_id: Uuid,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_game_state(room_id, game_id)
                .await
                .map_err(Into::into)
        })
    }

    fn upsert_game_state(
        &self,
        room_id: Uuid,
        game_id: String,
        payload: Value,
    ) -> BoxFuture<'static, StorageResult<GameStateEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .upsert_game_state(room_id, game_id, payload)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
