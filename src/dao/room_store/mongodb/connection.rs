//! Connection bootstrap and schema preparation for the MongoDB backend.

use std::time::Duration;

use mongodb::{
    Client, Database, IndexModel,
    bson::{Document, doc},
    options::{ClientOptions, IndexOptions},
};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};

pub const ROOM_COLLECTION: &str = "rooms";
pub const PLAYER_COLLECTION: &str = "room_players";
pub const GAME_STATE_COLLECTION: &str = "game_states";

const MAX_PING_ATTEMPTS: u32 = 10;
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(250);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Build a client and wait until the server answers a ping.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempts = 0;
    let mut delay = FIRST_RETRY_DELAY;
    while let Err(source) = database.run_command(doc! { "ping": 1 }).await {
        attempts += 1;
        if attempts >= MAX_PING_ATTEMPTS {
            return Err(MongoDaoError::InitialPing { attempts, source });
        }
        debug!(attempts, delay_ms = delay.as_millis() as u64, "MongoDB ping failed; retrying");
        sleep(delay).await;
        delay = (delay * 2).min(MAX_RETRY_DELAY);
    }

    Ok((client, database))
}

/// Create the unique indexes the upsert and uniqueness semantics rely on.
pub async fn ensure_indexes(database: &Database) -> MongoResult<()> {
    create_index(database, ROOM_COLLECTION, "slug", doc! {"slug": 1}, true).await?;
    create_index(
        database,
        PLAYER_COLLECTION,
        "room_id,order_index",
        doc! {"room_id": 1, "order_index": 1},
        false,
    )
    .await?;
    create_index(
        database,
        GAME_STATE_COLLECTION,
        "room_id,game_id",
        doc! {"room_id": 1, "game_id": 1},
        true,
    )
    .await
}

async fn create_index(
    database: &Database,
    collection: &'static str,
    index: &'static str,
    keys: Document,
    unique: bool,
) -> MongoResult<()> {
    let model = IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(Some(format!("{}_idx", index.replace(',', "_"))))
                .unique(Some(unique))
                .build(),
        )
        .build();

    database
        .collection::<Document>(collection)
        .create_index(model)
        .await
        .map_err(|source| MongoDaoError::EnsureIndex {
            collection,
            index,
            source,
        })?;
    Ok(())
}
