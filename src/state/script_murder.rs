//! Script Murder phase machine.
//!
//! The machine owns no storage: the service layer reads the stored payload,
//! computes the next [`ScriptRoomState`] through [`ScriptRoomState::transition`]
//! and upserts it back. Transitions are pure, so a rejected event never produces a
//! write.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Game identifier under which the machine stores its payload.
pub const SCRIPT_MURDER_GAME_ID: &str = "script_murder";
/// Chapter count used when the room's script does not declare one.
pub const UNKNOWN_TOTAL_CHAPTERS: u32 = 99;

/// Coarse-grained phase; only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPhase {
    /// Initial phase, before the host first advances.
    #[default]
    Lobby,
    /// Chapters are being played.
    Play,
    /// Terminal phase; stats are available.
    Ended,
}

/// End-of-game statistics, computed once when the machine enters [`ScriptPhase::Ended`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStats {
    /// Always equal to the script's chapter count.
    pub chapters_completed: u32,
    /// Chapters that received at least one vote.
    pub vote_rounds: u32,
    /// Chapters whose punishment was marked done.
    pub punishment_count: u32,
}

/// Payload stored under [`SCRIPT_MURDER_GAME_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRoomState {
    /// Current phase.
    #[serde(default)]
    pub phase: ScriptPhase,
    /// Zero-based chapter being played.
    #[serde(default)]
    pub chapter_index: u32,
    /// Chapter count of the script.
    #[serde(default = "unknown_total_chapters")]
    pub total_chapters: u32,
    /// Votes for the current chapter, keyed by player id.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub votes: IndexMap<String, String>,
    /// Whether the current chapter's punishment was completed.
    #[serde(default)]
    pub punishment_done: bool,
    /// Chapters already left that received at least one vote.
    #[serde(default)]
    pub vote_rounds: u32,
    /// Chapters already left whose punishment was done.
    #[serde(default)]
    pub punishment_count: u32,
    /// Set once the game ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ScriptStats>,
}

fn unknown_total_chapters() -> u32 {
    UNKNOWN_TOTAL_CHAPTERS
}

/// Events accepted by the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEvent {
    /// Move to the next chapter or end the game. Only the host may advance.
    Advance {
        /// Whether the caller's identity matches the room host.
        by_host: bool,
    },
    /// Record (or replace) a player's choice for the current chapter.
    Vote {
        /// Voting player.
        player_id: String,
        /// Sanitized option.
        option: String,
    },
    /// Mark the current chapter's punishment as completed.
    PunishmentDone,
}

/// Reasons a transition is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// A non-host tried to advance.
    #[error("only the host can advance the story")]
    HostOnly,
    /// The game already reached its terminal phase.
    #[error("game has ended")]
    GameEnded,
}

impl Default for ScriptRoomState {
    fn default() -> Self {
        Self::new(UNKNOWN_TOTAL_CHAPTERS)
    }
}

impl ScriptRoomState {
    /// Fresh lobby state for a script with `total_chapters` chapters.
    pub fn new(total_chapters: u32) -> Self {
        Self {
            phase: ScriptPhase::Lobby,
            chapter_index: 0,
            total_chapters,
            votes: IndexMap::new(),
            punishment_done: false,
            vote_rounds: 0,
            punishment_count: 0,
            stats: None,
        }
    }

    /// Whether the machine reached its terminal phase.
    pub fn is_ended(&self) -> bool {
        self.phase == ScriptPhase::Ended
    }

    /// Compute the state that results from applying `event`, leaving `self` untouched.
    pub fn transition(&self, event: ScriptEvent) -> Result<ScriptRoomState, ScriptError> {
        if let ScriptEvent::Advance { by_host: false } = event {
            return Err(ScriptError::HostOnly);
        }
        if self.is_ended() {
            return Err(ScriptError::GameEnded);
        }

        let mut next = self.clone();
        match event {
            ScriptEvent::Advance { .. } => next.advance(),
            ScriptEvent::Vote { player_id, option } => {
                next.votes.insert(player_id, option);
            }
            ScriptEvent::PunishmentDone => next.punishment_done = true,
        }
        Ok(next)
    }

    fn advance(&mut self) {
        if !self.votes.is_empty() {
            self.vote_rounds += 1;
        }
        if self.punishment_done {
            self.punishment_count += 1;
        }
        self.votes.clear();
        self.punishment_done = false;

        let next_index = self.chapter_index.saturating_add(1);
        if next_index >= self.total_chapters {
            self.phase = ScriptPhase::Ended;
            self.stats = Some(ScriptStats {
                chapters_completed: self.total_chapters,
                vote_rounds: self.vote_rounds,
                punishment_count: self.punishment_count,
            });
        } else {
            self.phase = ScriptPhase::Play;
            self.chapter_index = next_index;
        }
    }
}
