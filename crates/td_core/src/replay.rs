//! Replay system for recording and playing back matches.
//!
//! A replay stores the level and the stream of player inputs issued during
//! the match. Because the simulation is deterministic, that is enough to
//! recreate the whole match; no simulation state is ever stored.
//!
//! The level is embedded as JSON text: tower archetypes are an internally
//! tagged enum, which bincode cannot decode.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::LevelConfig;
use crate::error::{GameError, Result};
use crate::match_state::MatchState;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// A player input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayAction {
    /// Place a tower.
    PlaceTower {
        /// Tower archetype id.
        tower: String,
        /// Where to place it.
        position: Vec2Fixed,
    },
    /// Skip the remaining delay before the next wave.
    StartWave,
}

/// A single input record for replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCommand {
    /// Match tick at which the input was issued, before that tick ran.
    pub tick: u64,
    /// The input.
    pub action: ReplayAction,
}

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Level identifier.
    pub level_id: u32,
    /// Level definition as JSON.
    pub level_json: String,
    /// Step length every tick was run with.
    #[serde(with = "fixed_serde")]
    pub dt: Fixed,
    /// Inputs in tick order.
    pub commands: Vec<ReplayCommand>,
    /// Match tick when recording stopped.
    pub final_tick: u64,
    /// State hash when recording stopped.
    pub final_hash: u64,
}

impl Replay {
    /// Start a replay of `level` ticked with `dt`.
    ///
    /// # Errors
    /// Returns an error if the level cannot be serialized.
    pub fn new(level: &LevelConfig, dt: Fixed) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            level_id: level.id,
            level_json: level.to_json_string()?,
            dt,
            commands: Vec::new(),
            final_tick: 0,
            final_hash: 0,
        })
    }

    /// Record a tower placement.
    pub fn record_placement(&mut self, tick: u64, tower: impl Into<String>, position: Vec2Fixed) {
        self.commands.push(ReplayCommand {
            tick,
            action: ReplayAction::PlaceTower {
                tower: tower.into(),
                position,
            },
        });
    }

    /// Record an early wave start.
    pub fn record_start_wave(&mut self, tick: u64) {
        self.commands.push(ReplayCommand {
            tick,
            action: ReplayAction::StartWave,
        });
    }

    /// Finalize the replay with end-of-match state.
    pub fn finalize(&mut self, final_tick: u64, final_hash: u64) {
        self.final_tick = final_tick;
        self.final_hash = final_hash;
    }

    /// Encode to bytes.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))
    }

    /// Decode from bytes, checking the format version.
    ///
    /// # Errors
    /// Returns an error if deserialization fails or the version differs.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {}, got {}",
                REPLAY_VERSION, replay.version
            )));
        }

        Ok(replay)
    }

    /// Decode the embedded level.
    ///
    /// # Errors
    /// Returns an error if the level text is malformed.
    pub fn level(&self) -> Result<LevelConfig> {
        LevelConfig::from_json_str(&self.level_json)
    }

    /// Build the match as it was before the first tick.
    ///
    /// # Errors
    /// Returns an error if the level cannot be decoded or built.
    pub fn restore_initial_state(&self) -> Result<MatchState> {
        MatchState::new(&self.level()?)
    }

    /// Get commands for a specific tick.
    #[must_use]
    pub fn commands_at_tick(&self, tick: u64) -> Vec<&ReplayCommand> {
        self.commands.iter().filter(|cmd| cmd.tick == tick).collect()
    }

    /// Get the total duration of the replay in ticks.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.final_tick
    }

    /// Get the total number of commands in the replay.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    state: MatchState,
    current_tick: u64,
    command_index: usize,
}

impl ReplayPlayer {
    /// Create a new replay player from a replay.
    ///
    /// # Errors
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay) -> Result<Self> {
        let state = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            state,
            current_tick: 0,
            command_index: 0,
        })
    }

    /// Advance the replay by one tick.
    ///
    /// Returns true if there are more ticks to play.
    pub fn advance(&mut self) -> bool {
        if self.current_tick < self.replay.final_tick {
            self.step();
        }
        self.current_tick < self.replay.final_tick
    }

    /// Seek to a specific tick by replaying from the start.
    ///
    /// # Errors
    /// Returns an error if state restoration fails.
    pub fn seek(&mut self, target_tick: u64) -> Result<()> {
        self.state = self.replay.restore_initial_state()?;
        self.current_tick = 0;
        self.command_index = 0;

        while self.current_tick < target_tick && self.current_tick < self.replay.final_tick {
            self.step();
        }

        Ok(())
    }

    /// Get the current tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Get the match being replayed.
    #[must_use]
    pub const fn state(&self) -> &MatchState {
        &self.state
    }

    /// Get the replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Check if the replay has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current_tick >= self.replay.final_tick
    }

    /// Verify the replay produces the expected final hash.
    ///
    /// # Errors
    /// Returns an error if state restoration fails.
    pub fn verify(&mut self) -> Result<bool> {
        self.seek(self.replay.final_tick)?;
        Ok(self.state.state_hash() == self.replay.final_hash)
    }

    /// Get progress as a percentage (0-100).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_percent(&self) -> f64 {
        if self.replay.final_tick == 0 {
            100.0
        } else {
            (self.current_tick as f64 / self.replay.final_tick as f64) * 100.0
        }
    }

    fn step(&mut self) {
        // Apply all commands issued before this tick
        while let Some(cmd) = self.replay.commands.get(self.command_index) {
            if cmd.tick > self.current_tick {
                break;
            }
            match &cmd.action {
                ReplayAction::PlaceTower { tower, position } => {
                    if let Err(reason) = self.state.place_tower(tower, *position) {
                        debug!(tick = cmd.tick, %tower, %reason, "Replayed placement refused");
                    }
                }
                ReplayAction::StartWave => {
                    self.state.start_next_wave_now();
                }
            }
            self.command_index += 1;
        }

        self.state.tick(self.replay.dt);
        self.current_tick += 1;
    }
}
