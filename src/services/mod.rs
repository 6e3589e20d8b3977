//! Business logic behind the routes.

/// Rate limiting and payload caps shared by the write paths.
pub mod admission;
/// OpenAPI documentation generation.
pub mod documentation;
/// Generic per-room game state store.
pub mod game_state_service;
/// Health check service.
pub mod health_service;
/// Room password hashing.
pub mod password;
/// Room creation, lookup and joins.
pub mod room_service;
/// Script Murder actions on top of the game state store.
pub mod script_murder_service;
/// Background storage connection supervisor.
pub mod storage_supervisor;
