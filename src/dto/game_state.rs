//! Game-state query, write request and response.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{dao::models::GameStateEntity, dto::format_system_time};

/// Query string of `GET /rooms/{slug}/game-state`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GameStateQuery {
    /// Game whose state is requested.
    pub game_id: String,
}

/// Payload accepted by `POST /rooms/{slug}/game-state`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WriteGameStateRequest {
    /// Game whose state is replaced.
    #[serde(alias = "gameId")]
    pub game_id: String,
    /// Full replacement payload; must be a JSON object.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: Value,
}

/// Current state of one game in a room.
///
/// Both fields are `null` when nothing was written yet.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStateResponse {
    /// Stored payload.
    #[schema(value_type = Object, nullable = true)]
    pub state: Value,
    /// RFC 3339 time of the last write.
    pub updated_at: Option<String>,
}

impl GameStateResponse {
    /// Response for a key that was never written.
    pub fn empty() -> Self {
        Self {
            state: Value::Null,
            updated_at: None,
        }
    }
}

impl From<GameStateEntity> for GameStateResponse {
    fn from(value: GameStateEntity) -> Self {
        Self {
            state: value.payload,
            updated_at: Some(format_system_time(value.updated_at)),
        }
    }
}

impl From<Option<GameStateEntity>> for GameStateResponse {
    fn from(value: Option<GameStateEntity>) -> Self {
        value.map(Into::into).unwrap_or_else(Self::empty)
    }
}
