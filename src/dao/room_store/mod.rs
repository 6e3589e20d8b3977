//! Storage abstraction for rooms, rosters and game state.

pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{GameStateEntity, PlayerEntity, RoomEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use serde_json::Value;
use uuid::Uuid;

/// Abstraction over the persistence layer for rooms, rosters and game states.
///
/// Backends only provide select/insert/upsert primitives. None of the methods is
/// conditional on a previous read: `upsert_game_state` replaces the payload
/// unconditionally and `insert_player` trusts the caller-supplied `order_index`.
pub trait RoomStore: Send + Sync {
    /// Insert a new room; fails with a duplicate error when the slug is taken.
    fn insert_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a room by its slug.
    fn find_room_by_slug(&self, slug: String)
    -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Set the room host if none is assigned yet. Returns whether the host was written.
    fn assign_host_if_unset(
        &self,
        room_id: Uuid,
        host_id: String,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// List the room roster ordered by `order_index`.
    fn list_players(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Append a player to a room roster.
    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch one player of a room.
    fn find_player(
        &self,
        room_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Fetch the game state row for `(room_id, game_id)`.
    fn find_game_state(
        &self,
        room_id: Uuid,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>>;
    /// Insert or fully replace the game state row, stamping `updated_at`.
    fn upsert_game_state(
        &self,
        room_id: Uuid,
        game_id: String,
        payload: Value,
    ) -> BoxFuture<'static, StorageResult<GameStateEntity>>;
    /// Cheap liveness check.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the underlying connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
