//! Room and roster payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::models::{PlayerEntity, RoomEntity, RoomSettingsEntity, ScriptRoomEntity};
use crate::dto::format_system_time;

/// Payload accepted by `POST /rooms`.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    /// Requested capacity; clamped to the caller's tier.
    #[serde(default)]
    pub max_players: Option<u32>,
    /// Game the room starts on.
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub selected_game: Option<String>,
    /// Optional join password, hashed before storage.
    #[serde(default)]
    #[validate(length(max = 128))]
    pub password: Option<String>,
    /// Script Murder settings, when the room hosts a script.
    #[serde(default)]
    #[validate(nested)]
    pub script_room: Option<ScriptRoomInput>,
}

/// Script Murder flags chosen at room creation.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRoomInput {
    /// Selected script.
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub script_id: Option<String>,
    /// Number of chapters of the selected script, when known.
    #[serde(default)]
    #[validate(range(min = 1, max = 98))]
    pub total_chapters: Option<u32>,
}

impl From<ScriptRoomInput> for ScriptRoomEntity {
    fn from(value: ScriptRoomInput) -> Self {
        Self {
            script_id: value.script_id,
            total_chapters: value.total_chapters,
        }
    }
}

impl From<ScriptRoomEntity> for ScriptRoomInput {
    fn from(value: ScriptRoomEntity) -> Self {
        Self {
            script_id: value.script_id,
            total_chapters: value.total_chapters,
        }
    }
}

/// Payload accepted by `POST /rooms/{slug}/join`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    /// Name shown in the roster; sanitized and truncated.
    pub display_name: String,
    /// Required when the room has a password.
    #[serde(default)]
    pub password: Option<String>,
    /// Spectators bypass the capacity check.
    #[serde(default)]
    pub is_spectator: bool,
}

/// Room settings as exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettingsSummary {
    /// Capacity for non-spectators.
    pub max_players: u32,
    /// Game the room starts on.
    pub selected_game: Option<String>,
    /// Script Murder settings.
    pub script_room: Option<ScriptRoomInput>,
}

impl From<RoomSettingsEntity> for RoomSettingsSummary {
    fn from(value: RoomSettingsEntity) -> Self {
        Self {
            max_players: value.max_players,
            selected_game: value.selected_game,
            script_room: value.script_room.map(Into::into),
        }
    }
}

/// Public projection of a room; the password hash never leaves the server.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    /// Room UUID.
    pub id: String,
    /// Public room code.
    pub slug: String,
    /// Host identity, unset until a host is known.
    pub host_id: Option<String>,
    /// Whether joining requires a password.
    pub has_password: bool,
    /// Capacity and game selection.
    pub settings: RoomSettingsSummary,
    /// RFC 3339 creation time.
    pub created_at: String,
}

impl From<RoomEntity> for RoomSummary {
    fn from(value: RoomEntity) -> Self {
        Self {
            id: value.id.to_string(),
            slug: value.slug,
            host_id: value.host_id,
            has_password: value.password_hash.is_some(),
            settings: value.settings.into(),
            created_at: format_system_time(value.created_at),
        }
    }
}

/// Roster entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    /// Player UUID.
    pub id: String,
    /// Sanitized display name.
    pub display_name: String,
    /// Zero-based join order, spectators included.
    pub order_index: u32,
    /// Spectators do not count toward capacity.
    pub is_spectator: bool,
    /// RFC 3339 join time.
    pub joined_at: String,
}

impl From<PlayerEntity> for PlayerSummary {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id.to_string(),
            display_name: value.display_name,
            order_index: value.order_index,
            is_spectator: value.is_spectator,
            joined_at: format_system_time(value.joined_at),
        }
    }
}

/// Response of `POST /rooms`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateRoomResponse {
    /// The new room.
    pub room: RoomSummary,
}

/// Response of `GET /rooms/{slug}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomDetailsResponse {
    /// The room.
    pub room: RoomSummary,
    /// Roster ordered by `orderIndex`.
    pub players: Vec<PlayerSummary>,
}

/// Response of `POST /rooms/{slug}/join`.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinRoomResponse {
    /// The player that was just inserted.
    pub player: PlayerSummary,
    /// Full roster ordered by `orderIndex`.
    pub players: Vec<PlayerSummary>,
}
