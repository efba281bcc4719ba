//! Error types for the match simulation.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all match simulation errors.
///
/// Only construction and decoding can fail. Once a [`MatchState`] exists,
/// every tick-level operation is total.
///
/// [`MatchState`]: crate::match_state::MatchState
#[derive(Debug, Error)]
pub enum GameError {
    /// The route polyline cannot be used (too few points, zero length, or
    /// too long to measure).
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Level data is malformed or contains unrepresentable values.
    #[error("Invalid level shape: {0}")]
    InvalidLevelShape(String),

    /// A referenced archetype id does not exist in the level.
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    /// Invalid state, typically a failed replay encode/decode.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
