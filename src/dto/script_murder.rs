//! Script Murder action request and response.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::script_murder::ScriptRoomState;

/// Payload accepted by `POST /rooms/{slug}/script-murder`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMurderRequest {
    /// One of `advance`, `vote`, `punishment_done`.
    pub action: String,
    /// Voting player. Ignored by `advance`, which identifies the caller by `x-client-id`.
    #[serde(default)]
    pub player_id: Option<String>,
    /// Vote choice.
    #[serde(default)]
    pub option: Option<String>,
}

/// Result of an accepted action: the new canonical state.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScriptMurderResponse {
    /// Always `true`; failures use the error body.
    pub ok: bool,
    /// State after the action.
    pub state: ScriptRoomState,
}

impl From<ScriptRoomState> for ScriptMurderResponse {
    fn from(state: ScriptRoomState) -> Self {
        Self { ok: true, state }
    }
}
