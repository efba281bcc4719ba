//! JSON protocol for headless match communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the input/HUD controller
//! **Output (stdout):** Match state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0",...}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner answers every command with exactly one response line
//! 4. When a tick ends the match, a `game_over` line follows the `state`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","level_id":1,"tick":0}
//! -> {"cmd":"preview","tower":"archer","x":230,"y":180}
//! <- {"type":"preview","tower":"archer","x":230.0,"y":180.0,"allowed":true,"reason":null}
//! -> {"cmd":"place","tower":"archer","x":230,"y":180}
//! <- {"type":"placed","tower_id":0,"tower":"archer","gold":50}
//! -> {"cmd":"tick","count":20}
//! <- {"type":"state","snapshot":{...},"events":[...]}
//! -> {"cmd":"hash"}
//! <- {"type":"hash","tick":20,"hash":1234}
//! ```

use serde::{Deserialize, Serialize};

use td_core::events::MatchEvent;
use td_core::match_state::{MatchSnapshot, MatchSummary, PlacementError};

/// Protocol version announced in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the match by N ticks (default: 1).
    Tick {
        /// Ticks to run.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Place a tower.
    Place {
        /// Tower archetype id.
        tower: String,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },

    /// Check a placement without making it.
    Preview {
        /// Tower archetype id.
        tower: String,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },

    /// Start the next wave without waiting out its delay.
    StartWave,

    /// Query current match state without advancing time.
    Query,

    /// Get the end-of-match record.
    Summary,

    /// Get the current state hash (for determinism verification).
    Hash,

    /// Quit the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Level being played.
        level_id: u32,
        /// Current tick.
        tick: u64,
    },

    /// Acknowledgment of a command.
    Ack {
        /// Command name.
        cmd: String,
        /// Whether the command changed anything.
        applied: bool,
    },

    /// Error processing a command.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, if the line parsed.
        cmd: Option<String>,
    },

    /// Current match state, with the events since the previous `state`.
    State {
        /// Read-only match view.
        snapshot: MatchSnapshot,
        /// Events in the order they happened.
        events: Vec<MatchEvent>,
    },

    /// A tower was placed.
    Placed {
        /// New tower handle.
        tower_id: u32,
        /// Tower archetype id.
        tower: String,
        /// Gold left after paying.
        gold: u32,
    },

    /// A placement was refused.
    Rejected {
        /// Tower archetype id.
        tower: String,
        /// Why.
        reason: PlacementError,
    },

    /// Result of a placement check.
    Preview {
        /// Tower archetype id.
        tower: String,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
        /// Whether the placement would be accepted.
        allowed: bool,
        /// Why not, if refused.
        reason: Option<PlacementError>,
    },

    /// End-of-match record.
    Summary {
        /// The record.
        summary: MatchSummary,
    },

    /// State hash for determinism verification.
    Hash {
        /// Current tick.
        tick: u64,
        /// State hash.
        hash: u64,
    },

    /// The match has ended.
    GameOver {
        /// End-of-match record.
        summary: MatchSummary,
        /// Ticks simulated.
        ticks: u64,
    },
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(level_id: u32, tick: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            level_id,
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str, applied: bool) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
            applied,
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}","cmd":null}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Place { .. } => "place",
            Self::Preview { .. } => "preview",
            Self::StartWave => "start_wave",
            Self::Query => "query",
            Self::Summary => "summary",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}
