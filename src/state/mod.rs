//! Shared application state and the game state machines.

pub mod party_room;
pub mod script_murder;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig, dao::room_store::RoomStore, error::ServiceError,
    services::admission::RateLimiter,
};

/// Handle passed to every handler.
pub type SharedState = Arc<AppState>;

/// Central application state: the storage handle, the degraded flag, configuration and
/// the admission counters.
///
/// Nothing here caches room or game data; every request reads through the store.
pub struct AppState {
    room_store: RwLock<Option<Arc<dyn RoomStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    rate_limiter: RateLimiter,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let rate_limiter = RateLimiter::new(config.rate_limits.clone());
        Arc::new(Self {
            room_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            rate_limiter,
        })
    }

    /// Construct a state with `store` already installed.
    pub async fn with_store(config: AppConfig, store: Arc<dyn RoomStore>) -> SharedState {
        let state = Self::new(config);
        state.set_room_store(store).await;
        state
    }

    /// Obtain a handle to the current room store, if one is installed.
    pub async fn room_store(&self) -> Option<Arc<dyn RoomStore>> {
        let guard = self.room_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the room store or fail with [`ServiceError::Degraded`].
    pub async fn require_room_store(&self) -> Result<Arc<dyn RoomStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.room_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new room store implementation and leave degraded mode.
    pub async fn set_room_store(&self, store: Arc<dyn RoomStore>) {
        {
            let mut guard = self.room_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current room store and enter degraded mode.
    pub async fn clear_room_store(&self) {
        {
            let mut guard = self.room_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Per-client write quotas.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::room_store::memory::MemoryRoomStore;

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_room_store().await,
            Err(ServiceError::Degraded)
        ));

        state.set_room_store(Arc::new(MemoryRoomStore::new())).await;
        assert!(!state.is_degraded());
        assert!(state.require_room_store().await.is_ok());

        state.clear_room_store().await;
        assert!(state.is_degraded());
    }

    #[tokio::test]
    async fn watcher_sees_flag_changes() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();

        state.update_degraded(false);
        watcher.changed().await.unwrap();
        assert!(!*watcher.borrow_and_update());

        state.update_degraded(false);
        assert!(!watcher.has_changed().unwrap());
    }
}
