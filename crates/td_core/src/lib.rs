//! # TD Core
//!
//! Deterministic match simulation core for Path Defense.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//! - No floating-point math in the tick (uses fixed-point)
//!
//! This separation enables:
//! - Headless runners and tools
//! - Replay recording and verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`data`] - Level definitions as authored (RON / JSON)
//! - [`path`] - Route geometry
//! - [`unit`] - Enemy units: health, slows, movement
//! - [`tower`] - Attacker and slower towers
//! - [`waves`] - Wave spawn scheduling
//! - [`match_state`] - The match state machine
//! - [`replay`] - Input recording and playback
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod archetype;
pub mod data;
pub mod error;
pub mod events;
pub mod match_state;
pub mod math;
pub mod path;
pub mod replay;
pub mod rules;
pub mod tower;
pub mod unit;
pub mod waves;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::data::{LevelConfig, TowerData};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{MapPoint, MatchEvent, MatchStatus, TickEvents};
    pub use crate::match_state::{MatchSnapshot, MatchState, MatchSummary, PlacementError};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::path::PathProfile;
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::rules::{tick_dt, MatchRules, TICK_RATE};
    pub use crate::tower::TowerId;
    pub use crate::unit::UnitId;
}
