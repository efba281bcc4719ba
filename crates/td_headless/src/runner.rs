//! Scripted match runner.
//!
//! Drives a [`MatchState`] at the canonical tick rate, feeding it the inputs
//! of a [`MatchPlan`] and recording every accepted input into a [`Replay`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use td_core::data::LevelConfig;
use td_core::error::Result;
use td_core::events::TickEvents;
use td_core::match_state::{MatchState, MatchSummary, PlacementError};
use td_core::replay::Replay;
use td_core::rules::{tick_dt, TICK_RATE};

use crate::plan::MatchPlan;

/// Default tick limit: one hour of match time.
pub const DEFAULT_MAX_TICKS: u64 = 60 * 60 * TICK_RATE as u64;

/// A scripted placement the match refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefusedPlacement {
    /// Tick it was attempted before.
    pub tick: u64,
    /// Tower archetype id.
    pub tower: String,
    /// Why it was refused.
    pub reason: PlacementError,
}

/// Outcome of a scripted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// End-of-match record.
    pub summary: MatchSummary,
    /// Ticks simulated.
    pub ticks: u64,
    /// State hash at the end of the run.
    pub final_hash: u64,
    /// Whether the match reached a terminal state before the tick limit.
    pub finished: bool,
    /// Towers standing at the end.
    pub towers_placed: usize,
    /// Scripted placements that were refused.
    pub refused: Vec<RefusedPlacement>,
}

/// Runs one match from a plan.
#[derive(Debug)]
pub struct MatchRunner {
    state: MatchState,
    plan: MatchPlan,
    replay: Replay,
    max_ticks: u64,
    refused: Vec<RefusedPlacement>,
}

impl MatchRunner {
    /// Create a runner for `level` driven by `plan`.
    ///
    /// # Errors
    /// Returns an error if the level cannot start a match.
    pub fn new(level: &LevelConfig, plan: MatchPlan) -> Result<Self> {
        Ok(Self {
            state: MatchState::new(level)?,
            plan,
            replay: Replay::new(level, tick_dt())?,
            max_ticks: DEFAULT_MAX_TICKS,
            refused: Vec::new(),
        })
    }

    /// Stop after `max_ticks` even if the match is still running.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Apply the plan's inputs for the current tick, then run one tick.
    pub fn step(&mut self) -> TickEvents {
        let tick = self.state.get_tick();

        for placement in self.plan.placements_at(tick) {
            match self
                .state
                .place_tower_at(&placement.tower, placement.x, placement.y)
            {
                Ok(id) => {
                    if let Some(tower) = self.state.towers().iter().find(|t| t.id() == id) {
                        self.replay
                            .record_placement(tick, placement.tower.clone(), tower.position());
                    }
                }
                Err(reason) => {
                    warn!(tick, tower = %placement.tower, %reason, "Planned placement refused");
                    self.refused.push(RefusedPlacement {
                        tick,
                        tower: placement.tower.clone(),
                        reason,
                    });
                }
            }
        }

        if self.plan.calls_wave_at(tick) {
            if self.state.start_next_wave_now() {
                self.replay.record_start_wave(tick);
            } else {
                debug!(tick, "Early wave call ignored");
            }
        }

        self.state.tick(tick_dt())
    }

    /// Run until the match ends or the tick limit is hit.
    pub fn run(&mut self) -> RunReport {
        while !self.state.is_terminal() && self.state.get_tick() < self.max_ticks {
            self.step();
        }

        let final_hash = self.state.state_hash();
        self.replay.finalize(self.state.get_tick(), final_hash);

        let report = RunReport {
            summary: self.state.summary(),
            ticks: self.state.get_tick(),
            final_hash,
            finished: self.state.is_terminal(),
            towers_placed: self.state.towers().len(),
            refused: self.refused.clone(),
        };

        info!(
            level = report.summary.level_id,
            outcome = ?report.summary.outcome,
            score = report.summary.score,
            ticks = report.ticks,
            "Run complete"
        );
        report
    }

    /// The match being run.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// The replay recorded so far.
    pub fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Take the recorded replay.
    pub fn into_replay(self) -> Replay {
        self.replay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlannedPlacement;
    use td_core::events::MatchStatus;
    use td_core::replay::ReplayPlayer;
    use td_test_utils::fixtures::{green_plains, single_lane};

    fn two_archers() -> MatchPlan {
        MatchPlan::idle()
            .with_placement(PlannedPlacement::new(0, "archer", 230.0, 180.0))
            .with_placement(PlannedPlacement::new(40, "archer", 570.0, 250.0))
    }

    #[test]
    fn test_idle_run_loses() {
        let mut runner = MatchRunner::new(&single_lane(1, 1), MatchPlan::idle()).unwrap();
        let report = runner.run();

        assert!(report.finished);
        assert_eq!(report.summary.outcome, MatchStatus::GameOver);
        assert_eq!(report.towers_placed, 0);
        assert_eq!(report.final_hash, runner.state().state_hash());
    }

    #[test]
    fn test_planned_archer_wins() {
        let plan = MatchPlan::idle().with_placement(PlannedPlacement::new(0, "archer", 200.0, 140.0));
        let mut runner = MatchRunner::new(&single_lane(3, 1), plan).unwrap();
        let report = runner.run();

        assert_eq!(report.summary.outcome, MatchStatus::Victory);
        assert_eq!(report.summary.score, 10);
        assert!(report.refused.is_empty());
        assert_eq!(runner.replay().command_count(), 1);
    }

    #[test]
    fn test_refused_placements_are_reported() {
        let plan = MatchPlan::idle()
            .with_placement(PlannedPlacement::new(0, "archer", 200.0, 100.0))
            .with_placement(PlannedPlacement::new(0, "cannon", 200.0, 160.0));
        let mut runner = MatchRunner::new(&single_lane(1, 1), plan).unwrap();
        let report = runner.run();

        let reasons: Vec<_> = report.refused.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![PlacementError::OnRoad, PlacementError::UnknownArchetype]
        );
        assert_eq!(runner.replay().command_count(), 0);
    }

    #[test]
    fn test_tick_limit() {
        let mut runner = MatchRunner::new(&green_plains(), MatchPlan::idle())
            .unwrap()
            .with_max_ticks(10);
        let report = runner.run();

        assert!(!report.finished);
        assert_eq!(report.ticks, 10);
        assert_eq!(report.summary.outcome, MatchStatus::Playing);
    }

    #[test]
    fn test_early_wave_is_recorded() {
        let plan = two_archers().with_early_wave(0);
        let mut runner = MatchRunner::new(&green_plains(), plan).unwrap();
        runner.step();
        assert!(runner.state().wave_in_progress());
        assert_eq!(runner.replay().command_count(), 2);
    }

    #[test]
    fn test_recorded_replay_verifies() {
        let mut runner = MatchRunner::new(&green_plains(), two_archers()).unwrap();
        let report = runner.run();
        let replay = runner.into_replay();

        assert_eq!(replay.final_hash, report.final_hash);
        let mut player = ReplayPlayer::new(replay).unwrap();
        assert!(player.verify().unwrap());
    }
}
