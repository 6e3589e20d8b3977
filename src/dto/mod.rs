//! Wire types for the REST API.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod game_state;
pub mod health;
pub mod room;
pub mod script_murder;
pub mod validation;

/// Render a store timestamp as RFC 3339.
pub fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
