//! Generic `(room, game)` state store.
//!
//! Writes replace the stored payload in full; there is no version check, so concurrent
//! writers race and the last upsert wins.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{models::GameStateEntity, room_store::RoomStore},
    dto::{
        game_state::{GameStateResponse, WriteGameStateRequest},
        validation::validate_game_id,
    },
    error::ServiceError,
    services::{
        admission::{self, CallerContext, RateBucket},
        room_service::{check_slug, resolve_room},
    },
    state::{
        SharedState,
        party_room::{self, PARTY_ROOM_GAME_ID},
    },
};

fn check_game_id(game_id: &str) -> Result<(), ServiceError> {
    validate_game_id(game_id).map_err(|_| ServiceError::InvalidGameId(game_id.to_owned()))
}

/// Run the payload through the generic caps and the game's schema, if it has one.
pub(crate) fn validate_for_game(
    state: &SharedState,
    game_id: &str,
    payload: &Value,
) -> Result<(), ServiceError> {
    admission::check_payload(payload, &state.config().payload)?;
    if game_id == PARTY_ROOM_GAME_ID {
        party_room::validate_payload(payload).map_err(ServiceError::InvalidState)?;
    }
    Ok(())
}

/// Upsert a payload that already passed validation.
pub(crate) async fn persist(
    store: &Arc<dyn RoomStore>,
    room_id: Uuid,
    game_id: &str,
    payload: Value,
) -> Result<GameStateEntity, ServiceError> {
    let row = store
        .upsert_game_state(room_id, game_id.to_owned(), payload)
        .await?;
    debug!(room_id = %room_id, game_id, "game state written");
    Ok(row)
}

/// Read the state of `game_id` in the room. Unwritten keys yield a `null` state.
pub async fn get_state(
    state: &SharedState,
    slug: &str,
    game_id: &str,
) -> Result<GameStateResponse, ServiceError> {
    check_slug(slug)?;
    check_game_id(game_id)?;
    let store = state.require_room_store().await?;
    let room = resolve_room(&store, slug).await?;

    let row = store
        .find_game_state(room.id, game_id.to_owned())
        .await?;
    Ok(row.into())
}

/// Replace the state of `game_id` in the room.
pub async fn set_state(
    state: &SharedState,
    caller: &CallerContext,
    slug: &str,
    request: WriteGameStateRequest,
) -> Result<GameStateResponse, ServiceError> {
    admission::admit(state, RateBucket::StateWrite, caller)?;
    check_slug(slug)?;
    check_game_id(&request.game_id)?;
    validate_for_game(state, &request.game_id, &request.payload)?;

    let store = state.require_room_store().await?;
    let room = resolve_room(&store, slug).await?;
    let row = persist(&store, room.id, &request.game_id, request.payload).await?;
    Ok(row.into())
}
