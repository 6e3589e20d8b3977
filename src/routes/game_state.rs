//! Game-state routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::game_state::{GameStateQuery, GameStateResponse, WriteGameStateRequest},
    error::{AppError, ErrorBody},
    routes::extract::{ApiJson, ApiQuery},
    services::{admission::CallerContext, game_state_service},
    state::SharedState,
};

/// Generic game state endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/rooms/{slug}/game-state",
        get(read_game_state).post(write_game_state),
    )
}

/// Read the state of one game in a room. `state` is `null` until the first write.
#[utoipa::path(
    get,
    path = "/rooms/{slug}/game-state",
    tag = "game-state",
    params(("slug" = String, Path, description = "Room slug"), GameStateQuery),
    responses(
        (status = 200, description = "Current state", body = GameStateResponse),
        (status = 404, description = "Unknown room", body = ErrorBody),
    )
)]
pub async fn read_game_state(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    ApiQuery(query): ApiQuery<GameStateQuery>,
) -> Result<Json<GameStateResponse>, AppError> {
    Ok(Json(
        game_state_service::get_state(&state, &slug, &query.game_id).await?,
    ))
}

/// Replace the state of one game in a room.
#[utoipa::path(
    post,
    path = "/rooms/{slug}/game-state",
    tag = "game-state",
    params(("slug" = String, Path, description = "Room slug")),
    request_body = WriteGameStateRequest,
    responses(
        (status = 200, description = "Stored state", body = GameStateResponse),
        (status = 400, description = "Payload rejected", body = ErrorBody),
        (status = 409, description = "Payload does not match the game schema", body = ErrorBody),
        (status = 429, description = "Write quota exceeded", body = ErrorBody),
    )
)]
pub async fn write_game_state(
    State(state): State<SharedState>,
    caller: CallerContext,
    Path(slug): Path<String>,
    ApiJson(payload): ApiJson<WriteGameStateRequest>,
) -> Result<Json<GameStateResponse>, AppError> {
    Ok(Json(
        game_state_service::set_state(&state, &caller, &slug, payload).await?,
    ))
}
