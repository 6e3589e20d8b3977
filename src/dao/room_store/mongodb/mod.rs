//! MongoDB backend.

mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoRoomStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateSlug { slug } => StorageError::duplicate("room slug", slug),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
