//! HTTP routing.

use axum::{Router, extract::DefaultBodyLimit};

use crate::state::SharedState;

pub mod docs;
pub mod extract;
pub mod game_state;
pub mod health;
pub mod rooms;
pub mod script_murder;

/// Compose all route trees, wiring in shared state and documentation routes.
///
/// Bodies above the configured limit are refused before any JSON parsing.
pub fn router(state: SharedState) -> Router<()> {
    let body_limit = state.config().body_limit_bytes.0;

    let api_router = health::router()
        .merge(rooms::router())
        .merge(game_state::router())
        .merge(script_murder::router())
        .layer(DefaultBodyLimit::max(body_limit));

    api_router.merge(docs::router()).with_state(state)
}
