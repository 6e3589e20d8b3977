//! OpenAPI document.

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the room service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::join_room,
        crate::routes::game_state::read_game_state,
        crate::routes::game_state::write_game_state,
        crate::routes::script_murder::script_action,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::ScriptRoomInput,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::RoomSummary,
            crate::dto::room::RoomSettingsSummary,
            crate::dto::room::PlayerSummary,
            crate::dto::room::CreateRoomResponse,
            crate::dto::room::RoomDetailsResponse,
            crate::dto::room::JoinRoomResponse,
            crate::dto::game_state::WriteGameStateRequest,
            crate::dto::game_state::GameStateResponse,
            crate::dto::script_murder::ScriptMurderRequest,
            crate::dto::script_murder::ScriptMurderResponse,
            crate::state::script_murder::ScriptRoomState,
            crate::state::script_murder::ScriptPhase,
            crate::state::script_murder::ScriptStats,
            crate::state::party_room::PartyRoomState,
            crate::state::party_room::PartyRoomPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room creation and joins"),
        (name = "game-state", description = "Generic per-room game state"),
        (name = "script-murder", description = "Script Murder phase machine"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/rooms",
            "/rooms/{slug}",
            "/rooms/{slug}/join",
            "/rooms/{slug}/game-state",
            "/rooms/{slug}/script-murder",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
