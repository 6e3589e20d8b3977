//! Connection settings read from the environment.

use std::env;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const URI_ENV: &str = "MONGO_URI";
const DB_ENV: &str = "MONGO_DB";
const DEFAULT_DB: &str = "partyroom";
const APP_NAME: &str = "partyroom-back";

/// Parsed connection settings for the Mongo backend.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from `MONGO_URI`.
    pub options: ClientOptions,
    /// Database holding the collections.
    pub database_name: String,
}

impl MongoConfig {
    /// `MONGO_URI` is required; `MONGO_DB` falls back to `partyroom` when unset or empty.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = env::var(URI_ENV).map_err(|_| MongoDaoError::MissingEnvVar { var: URI_ENV })?;
        let database = env::var(DB_ENV).ok().filter(|name| !name.is_empty());
        Self::parse(&uri, database).await
    }

    /// Parse a connection string, tagging the client with the service name unless the URI
    /// already sets one.
    pub async fn parse(uri: &str, database: Option<String>) -> MongoResult<Self> {
        let mut options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

        Ok(Self {
            options,
            database_name: database.unwrap_or_else(|| DEFAULT_DB.to_owned()),
        })
    }
}
