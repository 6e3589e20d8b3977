//! Backend-neutral storage errors. Backends convert their own failures into these.

use std::error::Error;

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

type BoxedSource = Box<dyn Error + Send + Sync>;

/// Failure reported by a [`RoomStore`](crate::dao::room_store::RoomStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique key rejected the insert; nothing was written.
    #[error("duplicate {entity} `{key}`")]
    Duplicate {
        /// Kind of record, e.g. `room`.
        entity: &'static str,
        /// Conflicting key.
        key: String,
    },
    /// The backend failed mid-operation; a write may or may not have landed.
    #[error("storage backend failed: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Backend error.
        #[source]
        source: BoxedSource,
    },
}

impl StorageError {
    /// Unique-key violation on `entity`.
    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            key: key.into(),
        }
    }

    /// Wrap a backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        Self::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
