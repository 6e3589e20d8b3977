//! Backend-neutral entities.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::SystemTime;
use uuid::Uuid;

/// Durable record of a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Server-generated primary key.
    pub id: Uuid,
    /// Globally unique, immutable URL slug.
    pub slug: String,
    /// Identity allowed to perform host-only actions, unset until assigned.
    pub host_id: Option<String>,
    /// PHC-formatted password hash, present for protected rooms.
    pub password_hash: Option<String>,
    /// Room settings chosen at creation time.
    pub settings: RoomSettingsEntity,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Settings attached to a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomSettingsEntity {
    /// Maximum number of non-spectator players.
    pub max_players: u32,
    /// Game currently selected for the room, if any.
    pub selected_game: Option<String>,
    /// Script room flags, present when the room hosts a Script Murder session.
    pub script_room: Option<ScriptRoomEntity>,
}

/// Script room flags stored with the room settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptRoomEntity {
    /// Identifier of the selected script.
    pub script_id: Option<String>,
    /// Number of chapters in the selected script, when known.
    pub total_chapters: Option<u32>,
}

/// Player or spectator attached to a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Server-generated primary key.
    pub id: Uuid,
    /// Owning room.
    pub room_id: Uuid,
    /// Sanitized display name.
    pub display_name: String,
    /// Zero-based join order, computed from the roster size at insert time.
    pub order_index: u32,
    /// Spectators do not count toward the room capacity.
    pub is_spectator: bool,
    /// Join timestamp.
    pub joined_at: SystemTime,
}

/// The single row kept per `(room_id, game_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStateEntity {
    /// Owning room.
    pub room_id: Uuid,
    /// Game identifier, second half of the composite key.
    pub game_id: String,
    /// Opaque JSON object, replaced in full on every write.
    pub payload: Value,
    /// Set by the store on every write.
    pub updated_at: SystemTime,
}
