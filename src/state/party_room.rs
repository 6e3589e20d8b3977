//! Shape of the `party_room` payload, the one game whose writes are schema-checked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Game identifier whose payloads must match [`PartyRoomState`].
pub const PARTY_ROOM_GAME_ID: &str = "party_room";

const MAX_ENTRIES: usize = 24;
const MAX_ANSWER_CHARS: usize = 200;

/// Round phase of a party room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PartyRoomPhase {
    /// Waiting for players.
    Lobby,
    /// A prompt is open for answers.
    Question,
    /// Answers are shown.
    Reveal,
    /// Scores between rounds.
    Scoreboard,
}

/// Full party-room payload. Unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartyRoomState {
    /// Current phase.
    pub phase: PartyRoomPhase,
    /// Round number, at most 100.
    #[serde(default)]
    #[validate(range(max = 100))]
    pub round: u32,
    /// Prompt on screen.
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub prompt_id: Option<String>,
    /// Player whose turn it is.
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub turn_player_id: Option<String>,
    /// Score per player id.
    #[serde(default)]
    #[validate(length(max = 24))]
    pub scores: BTreeMap<String, i64>,
    /// Answer per player id.
    #[serde(default)]
    #[validate(custom(function = "validate_answers"))]
    pub answers: BTreeMap<String, String>,
}

fn validate_answers(answers: &BTreeMap<String, String>) -> Result<(), ValidationError> {
    if answers.len() > MAX_ENTRIES {
        let mut err = ValidationError::new("answers_count");
        err.message = Some(format!("at most {MAX_ENTRIES} answers (got {})", answers.len()).into());
        return Err(err);
    }
    if let Some((player, _)) = answers
        .iter()
        .find(|(_, answer)| answer.chars().count() > MAX_ANSWER_CHARS)
    {
        let mut err = ValidationError::new("answer_length");
        err.message = Some(
            format!("answer of `{player}` exceeds {MAX_ANSWER_CHARS} characters").into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Check `payload` against the party-room schema, returning a readable reason on failure.
pub fn validate_payload(payload: &Value) -> Result<PartyRoomState, String> {
    let state: PartyRoomState =
        serde_json::from_value(payload.clone()).map_err(|err| err.to_string())?;
    state.validate().map_err(|err| err.to_string())?;
    Ok(state)
}
