//! partyroom-back binary entrypoint wiring the REST layer, the admission guard and storage.

use std::{env, net::SocketAddr, sync::Arc, time::{Duration, Instant}};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use partyroom_back::{
    build_router,
    config::AppConfig,
    dao::room_store::memory::MemoryRoomStore,
    state::{AppState, SharedState},
};

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    start_storage(app_state.clone()).await;
    tokio::spawn(prune_rate_limits(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the backend named by `STORAGE_BACKEND` (`mongo` by default, or `memory`).
async fn start_storage(state: SharedState) {
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "mongo".into());
    match backend.as_str() {
        "memory" => {
            info!("using in-memory storage; data is lost on restart");
            state.set_room_store(Arc::new(MemoryRoomStore::new())).await;
        }
        #[cfg(feature = "mongo-store")]
        "mongo" => {
            tokio::spawn(partyroom_back::services::storage_supervisor::run(
                state,
                connect_mongo,
            ));
        }
        other => {
            warn!(backend = other, "unsupported storage backend; falling back to memory");
            state.set_room_store(Arc::new(MemoryRoomStore::new())).await;
        }
    }
}

#[cfg(feature = "mongo-store")]
async fn connect_mongo()
-> Result<Arc<dyn partyroom_back::dao::room_store::RoomStore>, partyroom_back::dao::storage::StorageError>
{
    use partyroom_back::dao::room_store::mongodb::{MongoConfig, MongoRoomStore};

    let config = MongoConfig::from_env().await?;
    let store = MongoRoomStore::connect(config).await?;
    Ok(Arc::new(store))
}

/// Periodically drop closed rate-limit windows so idle clients do not accumulate.
async fn prune_rate_limits(state: SharedState) {
    let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
    loop {
        ticker.tick().await;
        let removed = state.rate_limiter().prune(Instant::now());
        if removed > 0 {
            debug!(removed, "pruned rate-limit windows");
        }
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
