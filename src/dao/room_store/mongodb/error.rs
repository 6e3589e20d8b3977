//! Mongo driver failures.

use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for Mongo operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the Mongo backend before they become [`StorageError`](crate::dao::storage::StorageError)s.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("room slug `{slug}` already exists")]
    DuplicateSlug { slug: String },
    #[error("failed to save room `{slug}`")]
    SaveRoom {
        slug: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load room `{slug}`")]
    LoadRoom {
        slug: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to update host of room `{id}`")]
    AssignHost {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save player `{id}`")]
    SavePlayer {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load roster of room `{room_id}`")]
    LoadPlayers {
        room_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save game state `{game_id}` of room `{room_id}`")]
    SaveGameState {
        room_id: Uuid,
        game_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game state `{game_id}` of room `{room_id}`")]
    LoadGameState {
        room_id: Uuid,
        game_id: String,
        #[source]
        source: MongoError,
    },
    #[error("stored document `{id}` is malformed: {reason}")]
    Malformed { id: String, reason: String },
}

/// True when the server rejected a write because of a unique index.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    const DUPLICATE_KEY_CODE: i32 = 11000;
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
