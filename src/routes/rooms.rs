//! Room registry routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::room::{
        CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse,
        RoomDetailsResponse,
    },
    error::{AppError, ErrorBody},
    routes::extract::ApiJson,
    services::{admission::CallerContext, room_service},
    state::SharedState,
};

/// Room registry endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{slug}", get(get_room))
        .route("/rooms/{slug}/join", post(join_room))
}

/// Create a room under a generated slug.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    params(
        ("X-Client-Id" = Option<String>, Header, description = "Identity of the creator; becomes the room host"),
        ("X-Account-Tier" = Option<String>, Header, description = "`premium` lifts the free-tier capacity cap"),
    ),
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = CreateRoomResponse),
        (status = 400, description = "Invalid settings", body = ErrorBody),
        (status = 429, description = "Room creation quota exceeded", body = ErrorBody),
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    caller: CallerContext,
    ApiJson(payload): ApiJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), AppError> {
    payload.validate()?;
    let room = room_service::create_room(&state, &caller, payload).await?;
    Ok((StatusCode::CREATED, Json(CreateRoomResponse { room })))
}

/// Fetch a room and its roster.
#[utoipa::path(
    get,
    path = "/rooms/{slug}",
    tag = "rooms",
    params(("slug" = String, Path, description = "Room slug")),
    responses(
        (status = 200, description = "Room and roster", body = RoomDetailsResponse),
        (status = 404, description = "Unknown room", body = ErrorBody),
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<RoomDetailsResponse>, AppError> {
    Ok(Json(room_service::get_room(&state, &slug).await?))
}

/// Join a room as a player or spectator.
#[utoipa::path(
    post,
    path = "/rooms/{slug}/join",
    tag = "rooms",
    params(("slug" = String, Path, description = "Room slug")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined; returns the new player and the roster", body = JoinRoomResponse),
        (status = 403, description = "Wrong password", body = ErrorBody),
        (status = 404, description = "Unknown room", body = ErrorBody),
        (status = 409, description = "Room is full", body = ErrorBody),
        (status = 429, description = "Join quota exceeded", body = ErrorBody),
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    caller: CallerContext,
    Path(slug): Path<String>,
    ApiJson(payload): ApiJson<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    Ok(Json(
        room_service::join_room(&state, &caller, &slug, payload).await?,
    ))
}
