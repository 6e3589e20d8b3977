//! Persistence layer.

/// Database model definitions.
pub mod models;
/// Room, roster and game-state persistence backends.
pub mod room_store;
/// Storage abstraction layer for database operations.
pub mod storage;
