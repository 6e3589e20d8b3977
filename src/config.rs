//! Application-level configuration loading: room limits, admission quotas and payload caps.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PARTYROOM_BACK_CONFIG_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Capacity rules applied when rooms are created.
    pub rooms: RoomLimits,
    /// Caps enforced on every game-state write.
    pub payload: PayloadLimits,
    /// Per-client quotas for write paths.
    pub rate_limits: RateLimitConfig,
    /// Password hashing cost.
    pub password: PasswordConfig,
    /// Hard limit on request bodies, checked before JSON parsing.
    pub body_limit_bytes: BodyLimit,
    /// Set when the service runs behind a reverse proxy that appends the peer address to
    /// `x-forwarded-for`. Otherwise forwarding headers are ignored and quotas use the
    /// socket peer.
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
/// Capacity rules for rooms.
pub struct RoomLimits {
    /// `maxPlayers` used when the creator does not pick one.
    pub default_max_players: u32,
    /// Lowest capacity a room may be created with.
    pub min_players: u32,
    /// Highest capacity for premium accounts.
    pub max_players_cap: u32,
    /// Highest capacity for everyone else.
    pub free_tier_max_players: u32,
}

impl Default for RoomLimits {
    fn default() -> Self {
        Self {
            default_max_players: 12,
            min_players: 2,
            max_players_cap: 12,
            free_tier_max_players: 8,
        }
    }
}

impl RoomLimits {
    /// Resolve the capacity of a new room for the given tier.
    pub fn resolve_max_players(&self, requested: Option<u32>, premium: bool) -> u32 {
        let cap = if premium {
            self.max_players_cap
        } else {
            self.free_tier_max_players.min(self.max_players_cap)
        };
        requested
            .unwrap_or(self.default_max_players)
            .clamp(self.min_players, cap.max(self.min_players))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
/// Caps protecting the generic game-state store.
pub struct PayloadLimits {
    /// Maximum number of top-level keys.
    pub max_keys: usize,
    /// Maximum size of the serialized payload in bytes.
    pub max_bytes: usize,
}

impl Default for PayloadLimits {
    fn default() -> Self {
        Self {
            max_keys: 100,
            max_bytes: 50_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
/// Fixed-window quotas, counted per client address.
pub struct RateLimitConfig {
    /// Length of one counting window in seconds.
    pub window_secs: u64,
    /// Rooms a client may create per window.
    pub room_create: u32,
    /// Join attempts per window.
    pub join: u32,
    /// Game-state writes and Script Murder actions per window.
    pub state_write: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            room_create: 5,
            join: 30,
            state_write: 120,
        }
    }
}

impl RateLimitConfig {
    /// Window length as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
/// scrypt cost parameters for room passwords.
pub struct PasswordConfig {
    /// log2 of the scrypt CPU/memory cost.
    pub scrypt_log_n: u8,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self { scrypt_log_n: 15 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(transparent)]
/// Request body limit in bytes.
pub struct BodyLimit(pub usize);

impl Default for BodyLimit {
    fn default() -> Self {
        Self(128 * 1024)
    }
}

/// Why a configuration file could not be used.
#[derive(Debug, Error)]
enum ConfigError {
    #[error("cannot read config file: {0}")]
    Read(#[from] io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AppConfig {
    /// Load the configuration file, falling back to built-in defaults when it is missing or
    /// unusable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match Self::read(&path) {
            Ok(Some(config)) => {
                info!(
                    path = %path.display(),
                    free_tier_max_players = config.rooms.free_tier_max_players,
                    window_secs = config.rate_limits.window_secs,
                    "loaded configuration"
                );
                config
            }
            Ok(None) => {
                info!(path = %path.display(), "no config file; using built-in defaults");
                Self::default()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring config file; using built-in defaults");
                Self::default()
            }
        }
    }

    /// `Ok(None)` when the file does not exist.
    fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_capacity_is_capped() {
        let limits = RoomLimits::default();
        assert_eq!(limits.resolve_max_players(None, false), 8);
        assert_eq!(limits.resolve_max_players(Some(12), false), 8);
        assert_eq!(limits.resolve_max_players(None, true), 12);
        assert_eq!(limits.resolve_max_players(Some(40), true), 12);
        assert_eq!(limits.resolve_max_players(Some(0), true), 2);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let path = env::temp_dir().join("partyroom-back-missing-config.json");
        assert!(matches!(AppConfig::read(&path), Ok(None)));
    }

    #[test]
    fn malformed_file_is_reported() {
        let path = env::temp_dir().join(format!("partyroom-back-bad-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let result = AppConfig::read(&path);
        fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"rate_limits": {"join": 3}, "body_limit_bytes": 2048}"#)
                .unwrap();
        assert_eq!(config.rate_limits.join, 3);
        assert_eq!(config.rate_limits.window_secs, 60);
        assert_eq!(config.payload.max_keys, 100);
        assert_eq!(config.body_limit_bytes.0, 2048);
        assert!(!config.trust_forwarded_for);
    }
}
