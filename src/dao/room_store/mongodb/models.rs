//! BSON document shapes and their conversions to entities.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{
    GameStateEntity, PlayerEntity, RoomEntity, RoomSettingsEntity, ScriptRoomEntity,
};

/// `rooms` collection document. Identifiers are stored as their string form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    pub host_id: Option<String>,
    pub password_hash: Option<String>,
    pub settings: MongoRoomSettings,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomSettings {
    pub max_players: i64,
    pub selected_game: Option<String>,
    #[serde(default)]
    pub script_id: Option<String>,
    #[serde(default)]
    pub total_chapters: Option<i64>,
    #[serde(default)]
    pub script_room: bool,
}

/// `room_players` collection document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub room_id: String,
    pub display_name: String,
    pub order_index: i64,
    pub is_spectator: bool,
    pub joined_at: DateTime,
}

/// `game_states` collection document; the payload is kept as serialized JSON so the
/// store never interprets or reorders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameStateDocument {
    pub room_id: String,
    pub game_id: String,
    pub payload: String,
    pub updated_at: DateTime,
}

impl From<RoomEntity> for MongoRoomDocument {
    fn from(value: RoomEntity) -> Self {
        let script_room = value.settings.script_room.is_some();
        let (script_id, total_chapters) = value
            .settings
            .script_room
            .map(|script| (script.script_id, script.total_chapters.map(i64::from)))
            .unwrap_or_default();

        Self {
            id: value.id.to_string(),
            slug: value.slug,
            host_id: value.host_id,
            password_hash: value.password_hash,
            settings: MongoRoomSettings {
                max_players: i64::from(value.settings.max_players),
                selected_game: value.settings.selected_game,
                script_id,
                total_chapters,
                script_room,
            },
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoRoomDocument> for RoomEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRoomDocument) -> Result<Self, Self::Error> {
        let id = parse_uuid(&value.id)?;
        let settings = value.settings;
        let script_room = settings.script_room.then(|| ScriptRoomEntity {
            script_id: settings.script_id,
            total_chapters: settings
                .total_chapters
                .and_then(|total| u32::try_from(total).ok()),
        });

        Ok(Self {
            id,
            slug: value.slug,
            host_id: value.host_id,
            password_hash: value.password_hash,
            settings: RoomSettingsEntity {
                max_players: to_u32(&value.id, "max_players", settings.max_players)?,
                selected_game: settings.selected_game,
                script_room,
            },
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id.to_string(),
            room_id: value.room_id.to_string(),
            display_name: value.display_name,
            order_index: i64::from(value.order_index),
            is_spectator: value.is_spectator,
            joined_at: DateTime::from_system_time(value.joined_at),
        }
    }
}

impl TryFrom<MongoPlayerDocument> for PlayerEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPlayerDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&value.id)?,
            room_id: parse_uuid(&value.room_id)?,
            order_index: to_u32(&value.id, "order_index", value.order_index)?,
            display_name: value.display_name,
            is_spectator: value.is_spectator,
            joined_at: value.joined_at.to_system_time(),
        })
    }
}

impl TryFrom<MongoGameStateDocument> for GameStateEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameStateDocument) -> Result<Self, Self::Error> {
        let payload: Value =
            serde_json::from_str(&value.payload).map_err(|err| MongoDaoError::Malformed {
                id: format!("{}/{}", value.room_id, value.game_id),
                reason: err.to_string(),
            })?;

        Ok(Self {
            room_id: parse_uuid(&value.room_id)?,
            game_id: value.game_id,
            payload,
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::Malformed {
        id: raw.to_owned(),
        reason: err.to_string(),
    })
}

fn to_u32(id: &str, field: &str, value: i64) -> Result<u32, MongoDaoError> {
    u32::try_from(value).map_err(|_| MongoDaoError::Malformed {
        id: id.to_owned(),
        reason: format!("`{field}` out of range: {value}"),
    })
}
