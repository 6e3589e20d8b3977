//! Room and player registry: creation, lookup and joins.
//!
//! Joins are read-then-insert against the store. The join order comes from the roster
//! size observed before the insert, so two concurrent joins can both receive the same
//! `order_index`; the capacity check has the same window.

use std::{sync::Arc, time::SystemTime};

use rand::{Rng, rng};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        models::{PlayerEntity, RoomEntity, RoomSettingsEntity},
        room_store::RoomStore,
        storage::StorageError,
    },
    dto::{
        room::{
            CreateRoomRequest, JoinRoomRequest, JoinRoomResponse, PlayerSummary,
            RoomDetailsResponse, RoomSummary,
        },
        validation::{sanitize_display_name, validate_slug},
    },
    error::ServiceError,
    services::{
        admission::{self, CallerContext, RateBucket},
        password,
    },
    state::SharedState,
};

const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SLUG_LEN: usize = 8;
const SLUG_ATTEMPTS: usize = 5;

fn generate_slug() -> String {
    let mut rng = rng();
    (0..SLUG_LEN)
        .map(|_| SLUG_ALPHABET[rng.random_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

/// Reject slugs outside the safe pattern before touching storage.
pub(crate) fn check_slug(slug: &str) -> Result<(), ServiceError> {
    validate_slug(slug).map_err(|_| ServiceError::InvalidSlug(slug.to_owned()))
}

/// Resolve a room by slug or fail with [`ServiceError::RoomNotFound`].
pub(crate) async fn resolve_room(
    store: &Arc<dyn RoomStore>,
    slug: &str,
) -> Result<RoomEntity, ServiceError> {
    store
        .find_room_by_slug(slug.to_owned())
        .await?
        .ok_or_else(|| ServiceError::RoomNotFound(slug.to_owned()))
}

fn roster(players: Vec<PlayerEntity>) -> Vec<PlayerSummary> {
    players.into_iter().map(Into::into).collect()
}

/// Allocate a room under a freshly generated slug.
pub async fn create_room(
    state: &SharedState,
    caller: &CallerContext,
    request: CreateRoomRequest,
) -> Result<RoomSummary, ServiceError> {
    admission::admit(state, RateBucket::RoomCreate, caller)?;
    let store = state.require_room_store().await?;
    let config = state.config();

    let password_hash = match request.password {
        Some(password) => {
            Some(password::hash_password(password, config.password.scrypt_log_n).await?)
        }
        None => None,
    };
    let settings = RoomSettingsEntity {
        max_players: config
            .rooms
            .resolve_max_players(request.max_players, caller.premium),
        selected_game: request.selected_game,
        script_room: request.script_room.map(Into::into),
    };

    for attempt in 1..=SLUG_ATTEMPTS {
        let room = RoomEntity {
            id: Uuid::new_v4(),
            slug: generate_slug(),
            host_id: caller.client_id.clone(),
            password_hash: password_hash.clone(),
            settings: settings.clone(),
            created_at: SystemTime::now(),
        };

        match store.insert_room(room.clone()).await {
            Ok(()) => {
                info!(
                    room = %room.slug,
                    max_players = room.settings.max_players,
                    protected = room.password_hash.is_some(),
                    "room created"
                );
                return Ok(room.into());
            }
            Err(StorageError::Duplicate { key, .. }) => {
                debug!(attempt, slug = %key, "slug collision; regenerating");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ServiceError::Internal(format!(
        "no free slug after {SLUG_ATTEMPTS} attempts"
    )))
}

/// Public room projection with its roster.
pub async fn get_room(state: &SharedState, slug: &str) -> Result<RoomDetailsResponse, ServiceError> {
    check_slug(slug)?;
    let store = state.require_room_store().await?;
    let room = resolve_room(&store, slug).await?;
    let players = store.list_players(room.id).await?;

    Ok(RoomDetailsResponse {
        room: room.into(),
        players: roster(players),
    })
}

/// Add a player or spectator to a room.
pub async fn join_room(
    state: &SharedState,
    caller: &CallerContext,
    slug: &str,
    request: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    admission::admit(state, RateBucket::Join, caller)?;
    check_slug(slug)?;
    let display_name =
        sanitize_display_name(&request.display_name).ok_or(ServiceError::InvalidDisplayName)?;

    let store = state.require_room_store().await?;
    let room = resolve_room(&store, slug).await?;

    if let Some(hash) = room.password_hash.clone() {
        let supplied = request.password.unwrap_or_default();
        if !password::verify_password(supplied, hash).await? {
            debug!(room = %slug, "join rejected: wrong password");
            return Err(ServiceError::InvalidPassword);
        }
    }

    let existing = store.list_players(room.id).await?;
    if !request.is_spectator {
        let active = existing.iter().filter(|player| !player.is_spectator).count();
        if active >= room.settings.max_players as usize {
            return Err(ServiceError::RoomFull {
                max_players: room.settings.max_players,
            });
        }
    }

    let player = PlayerEntity {
        id: Uuid::new_v4(),
        room_id: room.id,
        display_name,
        order_index: u32::try_from(existing.len()).unwrap_or(u32::MAX),
        is_spectator: request.is_spectator,
        joined_at: SystemTime::now(),
    };
    store.insert_player(player.clone()).await?;

    if room.host_id.is_none()
        && !player.is_spectator
        && store
            .assign_host_if_unset(room.id, player.id.to_string())
            .await?
    {
        info!(room = %slug, player = %player.id, "first player promoted to host");
    }

    info!(
        room = %slug,
        player = %player.id,
        order_index = player.order_index,
        spectator = player.is_spectator,
        "player joined"
    );

    let players = store.list_players(room.id).await?;
    Ok(JoinRoomResponse {
        player: player.into(),
        players: roster(players),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dao::room_store::memory::MemoryRoomStore, dto::room::ScriptRoomInput,
        state::AppState,
    };

    pub(crate) async fn test_state() -> SharedState {
        let mut config = AppConfig::default();
        config.password.scrypt_log_n = 4;
        AppState::with_store(config, Arc::new(MemoryRoomStore::new())).await
    }

    pub(crate) fn caller() -> CallerContext {
        CallerContext::anonymous("127.0.0.1")
    }

    pub(crate) fn join(name: &str) -> JoinRoomRequest {
        JoinRoomRequest {
            display_name: name.into(),
            password: None,
            is_spectator: false,
        }
    }

    fn spectator(name: &str) -> JoinRoomRequest {
        JoinRoomRequest {
            is_spectator: true,
            ..join(name)
        }
    }

    #[test]
    fn generated_slugs_match_the_pattern() {
        for _ in 0..50 {
            let slug = generate_slug();
            assert_eq!(slug.len(), SLUG_LEN);
            assert!(check_slug(&slug).is_ok());
        }
    }

    #[tokio::test]
    async fn two_seat_room_scenario() {
        let state = test_state().await;
        let room = create_room(
            &state,
            &caller(),
            CreateRoomRequest {
                max_players: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(room.settings.max_players, 2);

        let a = join_room(&state, &caller(), &room.slug, join("A")).await.unwrap();
        assert_eq!(a.player.order_index, 0);
        let b = join_room(&state, &caller(), &room.slug, join("B")).await.unwrap();
        assert_eq!(b.player.order_index, 1);

        let err = join_room(&state, &caller(), &room.slug, join("C"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RoomFull { max_players: 2 }));

        let watcher = join_room(&state, &caller(), &room.slug, spectator("S"))
            .await
            .unwrap();
        assert_eq!(watcher.player.order_index, 2);
        assert!(watcher.player.is_spectator);

        let names: Vec<_> = watcher
            .players
            .iter()
            .map(|p| p.display_name.as_str())
            .collect();
        assert_eq!(names, ["A", "B", "S"]);
    }

    #[tokio::test]
    async fn password_gate() {
        let state = test_state().await;
        let room = create_room(
            &state,
            &caller(),
            CreateRoomRequest {
                password: Some("secret".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(room.has_password);

        let mut wrong = join("A");
        wrong.password = Some("guess".into());
        assert!(matches!(
            join_room(&state, &caller(), &room.slug, wrong).await,
            Err(ServiceError::InvalidPassword)
        ));
        assert!(matches!(
            join_room(&state, &caller(), &room.slug, join("A")).await,
            Err(ServiceError::InvalidPassword)
        ));

        let mut right = join("A");
        right.password = Some("secret".into());
        let joined = join_room(&state, &caller(), &room.slug, right).await.unwrap();
        assert_eq!(joined.players.len(), 1);
    }

    #[tokio::test]
    async fn host_is_creator_or_first_player() {
        let state = test_state().await;

        let owned = create_room(
            &state,
            &caller().with_client_id("creator"),
            CreateRoomRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(owned.host_id.as_deref(), Some("creator"));
        join_room(&state, &caller(), &owned.slug, join("A")).await.unwrap();
        let details = get_room(&state, &owned.slug).await.unwrap();
        assert_eq!(details.room.host_id.as_deref(), Some("creator"));

        let open = create_room(&state, &caller(), CreateRoomRequest::default())
            .await
            .unwrap();
        assert!(open.host_id.is_none());
        join_room(&state, &caller(), &open.slug, spectator("S")).await.unwrap();
        let first = join_room(&state, &caller(), &open.slug, join("B")).await.unwrap();
        join_room(&state, &caller(), &open.slug, join("C")).await.unwrap();

        let details = get_room(&state, &open.slug).await.unwrap();
        assert_eq!(details.room.host_id, Some(first.player.id));
    }

    #[tokio::test]
    async fn free_tier_capacity_is_clamped() {
        let state = test_state().await;
        let mut premium = caller();
        premium.premium = true;

        let free = create_room(
            &state,
            &caller(),
            CreateRoomRequest {
                max_players: Some(12),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let paid = create_room(
            &state,
            &premium,
            CreateRoomRequest {
                max_players: Some(12),
                script_room: Some(ScriptRoomInput {
                    script_id: Some("manor".into()),
                    total_chapters: Some(4),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(free.settings.max_players, 8);
        assert_eq!(paid.settings.max_players, 12);
        assert_eq!(
            paid.settings
                .script_room
                .as_ref()
                .and_then(|s| s.total_chapters),
            Some(4)
        );
    }

    #[tokio::test]
    async fn rejects_bad_input_before_storage() {
        let state = test_state().await;
        assert!(matches!(
            join_room(&state, &caller(), "Bad Slug", join("A")).await,
            Err(ServiceError::InvalidSlug(_))
        ));
        assert!(matches!(
            join_room(&state, &caller(), "nope1234", join("A")).await,
            Err(ServiceError::RoomNotFound(_))
        ));

        let room = create_room(&state, &caller(), CreateRoomRequest::default())
            .await
            .unwrap();
        assert!(matches!(
            join_room(&state, &caller(), &room.slug, join(" \n\t ")).await,
            Err(ServiceError::InvalidDisplayName)
        ));
    }

    #[tokio::test]
    async fn degraded_mode_fails_fast() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            get_room(&state, "abcd1234").await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn create_quota_is_enforced() {
        let mut config = AppConfig::default();
        config.rate_limits.room_create = 1;
        let state = AppState::with_store(config, Arc::new(MemoryRoomStore::new())).await;

        create_room(&state, &caller(), CreateRoomRequest::default())
            .await
            .unwrap();
        let err = create_room(&state, &caller(), CreateRoomRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "create_rate_limited");
    }
}
