//! Headless match runner for scripted play and CI verification.
//!
//! This crate wraps the deterministic core with everything that touches the
//! outside world:
//!
//! - **Level loading**: RON / JSON level files, validated on load
//! - **Scripted runs**: a [`plan::MatchPlan`] of timed placements
//! - **Replays**: recorded while running, verified by re-simulation
//! - **Interactive play**: JSON commands on stdin, responses on stdout
//! - **Determinism checks**: the same run repeated in parallel
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (tick, place, preview, ...)
//! - **stdout**: State updates and responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the command/response format.
//!
//! # Example
//!
//! ```bash
//! # Play interactively
//! echo '{"cmd":"tick","count":20}' | cargo run -p td_headless -- play --level assets/levels/green_plains.ron
//!
//! # Run a plan and record it
//! cargo run -p td_headless -- run --level assets/levels/green_plains.ron --plan plan.ron --record match.replay
//!
//! # Verify the recording
//! cargo run -p td_headless -- replay --file match.replay --verify
//! ```

pub mod interactive;
pub mod level_loader;
pub mod plan;
pub mod protocol;
pub mod replay_file;
pub mod runner;
pub mod verify;

pub use interactive::{serve, Session, SessionError};
pub use level_loader::{load_level, LevelLoadError};
pub use plan::{MatchPlan, PlanError, PlannedPlacement};
pub use protocol::{Command, Response};
pub use replay_file::{load_replay, save_replay, ReplayFileError};
pub use runner::{MatchRunner, RunReport};
pub use verify::{verify_determinism, DeterminismReport};
