//! Service errors and their HTTP mapping.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::IntoResponse,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError, services::admission::RateBucket, state::script_murder::ScriptError,
};

/// Errors that can occur in service layer operations.
///
/// Every variant maps to a stable machine-readable kind (see [`ServiceError::kind`]).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed; the caller should re-read before retrying a write.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Unknown or expired room slug.
    #[error("room `{0}` not found")]
    RoomNotFound(String),
    /// Slug does not match the safe-character pattern.
    #[error("invalid room slug: {0}")]
    InvalidSlug(String),
    /// Room password mismatch.
    #[error("invalid room password")]
    InvalidPassword,
    /// Capacity reached for non-spectators.
    #[error("room is full ({max_players} players)")]
    RoomFull {
        /// Capacity of the room.
        max_players: u32,
    },
    /// Display name is empty once sanitized.
    #[error("display name must contain at least one visible character")]
    InvalidDisplayName,
    /// Game identifier does not match the allowed pattern.
    #[error("invalid game id: {0}")]
    InvalidGameId(String),
    /// Payload is not a JSON object.
    #[error("payload must be a JSON object")]
    InvalidPayloadType,
    /// Payload has too many top-level keys.
    #[error("payload has {count} keys (max {max})")]
    TooManyKeys {
        /// Keys found.
        count: usize,
        /// Configured limit.
        max: usize,
    },
    /// Serialized payload exceeds the byte cap.
    #[error("payload is {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Serialized size.
        size: usize,
        /// Configured limit.
        max: usize,
    },
    /// Payload or stored state does not match the game's schema.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Caller is not the room host.
    #[error("only the room host can perform this action")]
    HostOnly,
    /// Game already reached its terminal phase.
    #[error("game has ended")]
    GameEnded,
    /// Vote references a player that is not in the room.
    #[error("player `{0}` is not in this room")]
    InvalidPlayer(String),
    /// Vote is missing its player or option.
    #[error("vote requires a playerId and an option")]
    MissingPlayerOrOption,
    /// Unrecognized Script Murder action.
    #[error("unknown action `{0}`")]
    InvalidAction(String),
    /// Client exceeded a write quota.
    #[error("too many requests; retry in {retry_after_secs}s")]
    RateLimited {
        /// Quota that was exceeded.
        bucket: RateBucket,
        /// Seconds until the current window closes.
        retry_after_secs: u64,
    },
    /// Other malformed input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Unexpected failure inside the service (hashing, task join).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Unavailable(_) => "storage_error",
            ServiceError::Degraded => "degraded",
            ServiceError::RoomNotFound(_) => "room_not_found",
            ServiceError::InvalidSlug(_) => "invalid_slug",
            ServiceError::InvalidPassword => "invalid_password",
            ServiceError::RoomFull { .. } => "room_full",
            ServiceError::InvalidDisplayName => "invalid_display_name",
            ServiceError::InvalidGameId(_) => "invalid_game_id",
            ServiceError::InvalidPayloadType => "invalid_payload_type",
            ServiceError::TooManyKeys { .. } => "too_many_keys",
            ServiceError::PayloadTooLarge { .. } => "payload_too_large",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::HostOnly => "host_only",
            ServiceError::GameEnded => "game_ended",
            ServiceError::InvalidPlayer(_) => "invalid_player",
            ServiceError::MissingPlayerOrOption => "missing_player_or_option",
            ServiceError::InvalidAction(_) => "invalid_action",
            ServiceError::RateLimited {
                bucket: RateBucket::RoomCreate,
                ..
            } => "create_rate_limited",
            ServiceError::RateLimited { .. } => "rate_limited",
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ScriptError> for ServiceError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::HostOnly => ServiceError::HostOnly,
            ScriptError::GameEnded => ServiceError::GameEnded,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest {
            kind: "invalid_input",
            message: format!("validation failed: {}", err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge {
                kind: "payload_too_large",
                message,
            }
        } else {
            AppError::BadRequest {
                kind: "invalid_input",
                message,
            }
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest {
            kind: "invalid_input",
            message: rejection.body_text(),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input, rejected before touching storage.
    #[error("bad request: {message}")]
    BadRequest {
        /// Machine-readable kind.
        kind: &'static str,
        /// Human-readable message.
        message: String,
    },
    /// Authority or password violation.
    #[error("forbidden: {message}")]
    Forbidden {
        /// Machine-readable kind.
        kind: &'static str,
        /// Human-readable message.
        message: String,
    },
    /// Requested resource not found.
    #[error("not found: {message}")]
    NotFound {
        /// Machine-readable kind.
        kind: &'static str,
        /// Human-readable message.
        message: String,
    },
    /// Conflict with the current room or game state.
    #[error("conflict: {message}")]
    Conflict {
        /// Machine-readable kind.
        kind: &'static str,
        /// Human-readable message.
        message: String,
    },
    /// Request body exceeds the configured body limit.
    #[error("payload too large: {message}")]
    PayloadTooLarge {
        /// Machine-readable kind.
        kind: &'static str,
        /// Human-readable message.
        message: String,
    },
    /// Write quota exceeded.
    #[error("too many requests: {message}")]
    TooManyRequests {
        /// Machine-readable kind.
        kind: &'static str,
        /// Human-readable message.
        message: String,
        /// Value of the `Retry-After` header.
        retry_after_secs: u64,
    },
    /// Storage unavailable or degraded; retryable.
    #[error("service unavailable: {message}")]
    ServiceUnavailable {
        /// Machine-readable kind.
        kind: &'static str,
        /// Human-readable message.
        message: String,
    },
    /// Internal server error.
    #[error("internal error: {message}")]
    Internal {
        /// Machine-readable kind.
        kind: &'static str,
        /// Human-readable message.
        message: String,
    },
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match err {
            ServiceError::Unavailable(_) | ServiceError::Degraded => {
                AppError::ServiceUnavailable { kind, message }
            }
            ServiceError::RoomNotFound(_) => AppError::NotFound { kind, message },
            ServiceError::InvalidPassword | ServiceError::HostOnly => {
                AppError::Forbidden { kind, message }
            }
            ServiceError::RoomFull { .. }
            | ServiceError::GameEnded
            | ServiceError::InvalidState(_) => AppError::Conflict { kind, message },
            ServiceError::RateLimited {
                retry_after_secs, ..
            } => AppError::TooManyRequests {
                kind,
                message,
                retry_after_secs,
            },
            ServiceError::InvalidSlug(_)
            | ServiceError::InvalidDisplayName
            | ServiceError::InvalidGameId(_)
            | ServiceError::InvalidPayloadType
            | ServiceError::TooManyKeys { .. }
            | ServiceError::PayloadTooLarge { .. }
            | ServiceError::InvalidPlayer(_)
            | ServiceError::MissingPlayerOrOption
            | ServiceError::InvalidAction(_)
            | ServiceError::InvalidInput(_) => AppError::BadRequest { kind, message },
            ServiceError::Internal(_) => AppError::Internal { kind, message },
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable error kind.
    pub kind: String,
    /// Human-readable description.
    pub message: String,
    /// True when the same request may succeed later.
    pub retryable: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, message, retry_after) = match self {
            AppError::BadRequest { kind, message } => (StatusCode::BAD_REQUEST, kind, message, None),
            AppError::Forbidden { kind, message } => (StatusCode::FORBIDDEN, kind, message, None),
            AppError::NotFound { kind, message } => (StatusCode::NOT_FOUND, kind, message, None),
            AppError::Conflict { kind, message } => (StatusCode::CONFLICT, kind, message, None),
            AppError::PayloadTooLarge { kind, message } => {
                (StatusCode::PAYLOAD_TOO_LARGE, kind, message, None)
            }
            AppError::TooManyRequests {
                kind,
                message,
                retry_after_secs,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                kind,
                message,
                Some(retry_after_secs),
            ),
            AppError::ServiceUnavailable { kind, message } => {
                (StatusCode::SERVICE_UNAVAILABLE, kind, message, None)
            }
            AppError::Internal { kind, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, kind, message, None)
            }
        };

        let payload = Json(ErrorBody {
            kind: kind.into(),
            message,
            retryable: matches!(
                status,
                StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
            ),
        });

        let mut response = (status, payload).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_quota_has_its_own_kind() {
        let err = ServiceError::RateLimited {
            bucket: RateBucket::RoomCreate,
            retry_after_secs: 3,
        };
        assert_eq!(err.kind(), "create_rate_limited");

        let err = ServiceError::RateLimited {
            bucket: RateBucket::Join,
            retry_after_secs: 3,
        };
        assert_eq!(err.kind(), "rate_limited");
    }

    #[test]
    fn rate_limit_response_carries_retry_after() {
        let err: AppError = ServiceError::RateLimited {
            bucket: RateBucket::StateWrite,
            retry_after_secs: 17,
        }
        .into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "17");
    }

    #[test]
    fn authority_and_phase_errors_map_to_distinct_statuses() {
        let host: AppError = ServiceError::HostOnly.into();
        let ended: AppError = ServiceError::GameEnded.into();
        assert_eq!(host.into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(ended.into_response().status(), StatusCode::CONFLICT);
    }
}
