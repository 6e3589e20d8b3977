//! Script Murder actions, each a read-compute-upsert cycle over the game state store.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{models::RoomEntity, room_store::RoomStore},
    dto::{script_murder::ScriptMurderRequest, validation::sanitize_option},
    error::ServiceError,
    services::{
        admission::{self, CallerContext, RateBucket},
        game_state_service::{persist, validate_for_game},
        room_service::{check_slug, resolve_room},
    },
    state::{
        SharedState,
        script_murder::{SCRIPT_MURDER_GAME_ID, ScriptEvent, ScriptRoomState, UNKNOWN_TOTAL_CHAPTERS},
    },
};

#[derive(Debug)]
enum Action {
    Advance { claimed_id: Option<String> },
    Vote { player_id: String, option: String },
    PunishmentDone,
}

fn parse_action(
    caller: &CallerContext,
    request: ScriptMurderRequest,
) -> Result<Action, ServiceError> {
    match request.action.as_str() {
        "advance" => Ok(Action::Advance {
            claimed_id: caller.client_id.clone(),
        }),
        "vote" => {
            let player_id = request
                .player_id
                .map(|id| id.trim().to_owned())
                .filter(|id| !id.is_empty());
            let option = request.option.as_deref().and_then(sanitize_option);
            match (player_id, option) {
                (Some(player_id), Some(option)) => Ok(Action::Vote { player_id, option }),
                _ => Err(ServiceError::MissingPlayerOrOption),
            }
        }
        "punishment_done" => Ok(Action::PunishmentDone),
        other => Err(ServiceError::InvalidAction(other.to_owned())),
    }
}

/// Current machine state of the room, or a fresh lobby when nothing was written yet.
async fn load_state(
    store: &Arc<dyn RoomStore>,
    room: &RoomEntity,
) -> Result<ScriptRoomState, ServiceError> {
    match store
        .find_game_state(room.id, SCRIPT_MURDER_GAME_ID.to_owned())
        .await?
    {
        Some(row) => serde_json::from_value(row.payload).map_err(|err| {
            ServiceError::InvalidState(format!("stored script state is malformed: {err}"))
        }),
        None => {
            let total = room
                .settings
                .script_room
                .as_ref()
                .and_then(|script| script.total_chapters)
                .unwrap_or(UNKNOWN_TOTAL_CHAPTERS);
            Ok(ScriptRoomState::new(total))
        }
    }
}

async fn ensure_member(
    store: &Arc<dyn RoomStore>,
    room: &RoomEntity,
    player_id: &str,
) -> Result<(), ServiceError> {
    let invalid = || ServiceError::InvalidPlayer(player_id.to_owned());
    let id = Uuid::parse_str(player_id).map_err(|_| invalid())?;
    store.find_player(room.id, id).await?.ok_or_else(invalid)?;
    Ok(())
}

/// Apply one action and persist the resulting state.
pub async fn apply_action(
    state: &SharedState,
    caller: &CallerContext,
    slug: &str,
    request: ScriptMurderRequest,
) -> Result<ScriptRoomState, ServiceError> {
    admission::admit(state, RateBucket::StateWrite, caller)?;
    check_slug(slug)?;
    let action = parse_action(caller, request)?;

    let store = state.require_room_store().await?;
    let room = resolve_room(&store, slug).await?;
    let current = load_state(&store, &room).await?;

    let event = match action {
        Action::Advance { claimed_id } => ScriptEvent::Advance {
            by_host: room.host_id.is_some() && claimed_id == room.host_id,
        },
        Action::Vote { player_id, option } => {
            if current.is_ended() {
                return Err(ServiceError::GameEnded);
            }
            ensure_member(&store, &room, &player_id).await?;
            ScriptEvent::Vote { player_id, option }
        }
        Action::PunishmentDone => ScriptEvent::PunishmentDone,
    };

    let next = current.transition(event.clone()).inspect_err(|err| {
        debug!(room = %slug, event = ?event, error = %err, "script action rejected");
    })?;

    let payload = serde_json::to_value(&next)
        .map_err(|err| ServiceError::Internal(format!("cannot encode script state: {err}")))?;
    validate_for_game(state, SCRIPT_MURDER_GAME_ID, &payload)?;
    persist(&store, room.id, SCRIPT_MURDER_GAME_ID, payload).await?;

    info!(
        room = %slug,
        phase = ?next.phase,
        chapter = next.chapter_index,
        "script state updated"
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dto::room::{CreateRoomRequest, ScriptRoomInput},
        services::{
            game_state_service::get_state,
            room_service::{
                create_room, join_room,
                tests::{caller, join, test_state},
            },
        },
        state::script_murder::{ScriptPhase, ScriptStats},
    };

    const HOST: &str = "host-1";

    fn request(action: &str, player_id: Option<&str>, option: Option<&str>) -> ScriptMurderRequest {
        ScriptMurderRequest {
            action: action.into(),
            player_id: player_id.map(Into::into),
            option: option.map(Into::into),
        }
    }

    fn host() -> CallerContext {
        caller().with_client_id(HOST)
    }

    async fn script_room(state: &SharedState, chapters: Option<u32>) -> String {
        create_room(
            state,
            &host(),
            CreateRoomRequest {
                script_room: Some(ScriptRoomInput {
                    script_id: Some("manor".into()),
                    total_chapters: chapters,
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .slug
    }

    #[tokio::test]
    async fn three_chapter_scenario() {
        let state = test_state().await;
        let slug = script_room(&state, Some(3)).await;
        let player = join_room(&state, &caller(), &slug, join("P")).await.unwrap();
        let player_id = player.player.id;

        let s1 = apply_action(&state, &host(), &slug, request("advance", None, None))
            .await
            .unwrap();
        assert_eq!((s1.phase, s1.chapter_index), (ScriptPhase::Play, 1));

        let voted = apply_action(
            &state,
            &caller(),
            &slug,
            request("vote", Some(&player_id), Some("  the butler ")),
        )
        .await
        .unwrap();
        assert_eq!(voted.votes[&player_id], "the butler");

        let s2 = apply_action(&state, &host(), &slug, request("advance", None, None))
            .await
            .unwrap();
        assert_eq!(s2.chapter_index, 2);
        assert!(s2.votes.is_empty());

        apply_action(&state, &caller(), &slug, request("punishment_done", None, None))
            .await
            .unwrap();
        let ended = apply_action(&state, &host(), &slug, request("advance", None, None))
            .await
            .unwrap();
        assert_eq!(ended.phase, ScriptPhase::Ended);
        assert_eq!(
            ended.stats,
            Some(ScriptStats {
                chapters_completed: 3,
                vote_rounds: 1,
                punishment_count: 1,
            })
        );

        assert!(matches!(
            apply_action(&state, &host(), &slug, request("advance", None, None)).await,
            Err(ServiceError::GameEnded)
        ));
        assert!(matches!(
            apply_action(&state, &caller(), &slug, request("vote", Some(&player_id), Some("x"))).await,
            Err(ServiceError::GameEnded)
        ));

        let stored = get_state(&state, &slug, SCRIPT_MURDER_GAME_ID).await.unwrap();
        assert_eq!(stored.state["phase"], "ended");
    }

    #[tokio::test]
    async fn only_the_host_advances() {
        let state = test_state().await;
        let slug = script_room(&state, Some(3)).await;

        let err = apply_action(
            &state,
            &caller().with_client_id("someone-else"),
            &slug,
            request("advance", None, None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::HostOnly));

        let err = apply_action(&state, &caller(), &slug, request("advance", Some(HOST), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::HostOnly));

        let advanced = apply_action(&state, &host(), &slug, request("advance", None, None))
            .await
            .unwrap();
        assert_eq!(advanced.chapter_index, 1);
    }

    #[tokio::test]
    async fn votes_need_a_known_player_and_an_option() {
        let state = test_state().await;
        let slug = script_room(&state, None).await;

        assert!(matches!(
            apply_action(&state, &caller(), &slug, request("vote", Some("p1"), None)).await,
            Err(ServiceError::MissingPlayerOrOption)
        ));
        assert!(matches!(
            apply_action(&state, &caller(), &slug, request("vote", Some(""), Some("a"))).await,
            Err(ServiceError::MissingPlayerOrOption)
        ));
        assert!(matches!(
            apply_action(&state, &caller(), &slug, request("vote", Some("ghost"), Some("a"))).await,
            Err(ServiceError::InvalidPlayer(_))
        ));
        let stranger = Uuid::new_v4().to_string();
        assert!(matches!(
            apply_action(&state, &caller(), &slug, request("vote", Some(&stranger), Some("a"))).await,
            Err(ServiceError::InvalidPlayer(_))
        ));
    }

    #[tokio::test]
    async fn unknown_script_uses_sentinel_chapter_count() {
        let state = test_state().await;
        let slug = script_room(&state, None).await;

        let state_after = apply_action(&state, &caller(), &slug, request("punishment_done", None, None))
            .await
            .unwrap();
        assert_eq!(state_after.total_chapters, UNKNOWN_TOTAL_CHAPTERS);
        assert!(state_after.punishment_done);
        assert_eq!(state_after.phase, ScriptPhase::Lobby);
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let state = test_state().await;
        let slug = script_room(&state, Some(2)).await;
        assert!(matches!(
            apply_action(&state, &host(), &slug, request("rewind", None, None)).await,
            Err(ServiceError::InvalidAction(_))
        ));
    }
}
