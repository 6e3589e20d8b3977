//! Script Murder action route.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};

use crate::{
    dto::script_murder::{ScriptMurderRequest, ScriptMurderResponse},
    error::{AppError, ErrorBody},
    routes::extract::ApiJson,
    services::{admission::CallerContext, script_murder_service},
    state::SharedState,
};

/// Script Murder endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/rooms/{slug}/script-murder", post(script_action))
}

/// Apply `advance`, `vote` or `punishment_done` and return the new state.
#[utoipa::path(
    post,
    path = "/rooms/{slug}/script-murder",
    tag = "script-murder",
    params(
        ("slug" = String, Path, description = "Room slug"),
        ("X-Client-Id" = Option<String>, Header, description = "Caller identity, compared to the room host on `advance`"),
    ),
    request_body = ScriptMurderRequest,
    responses(
        (status = 200, description = "Action applied", body = ScriptMurderResponse),
        (status = 400, description = "Malformed action", body = ErrorBody),
        (status = 403, description = "Caller is not the host", body = ErrorBody),
        (status = 409, description = "Game has ended", body = ErrorBody),
    )
)]
pub async fn script_action(
    State(state): State<SharedState>,
    caller: CallerContext,
    Path(slug): Path<String>,
    ApiJson(payload): ApiJson<ScriptMurderRequest>,
) -> Result<Json<ScriptMurderResponse>, AppError> {
    let next = script_murder_service::apply_action(&state, &caller, &slug, payload).await?;
    Ok(Json(next.into()))
}
