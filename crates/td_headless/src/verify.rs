//! Determinism verification across parallel runs.
//!
//! Plays the same level and plan several times on the rayon pool and
//! compares the final state hashes.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use td_core::data::LevelConfig;
use td_core::error::Result;

use crate::plan::MatchPlan;
use crate::runner::MatchRunner;

/// Result of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismReport {
    /// Number of runs.
    pub runs: usize,
    /// Final state hash of each run, in run order.
    pub hashes: Vec<u64>,
    /// Tick count of each run, in run order.
    pub ticks: Vec<u64>,
}

impl DeterminismReport {
    /// Whether every run ended in the same state at the same tick.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1]) && self.ticks.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run `level` with `plan` `runs` times in parallel and collect the results.
///
/// # Errors
/// Returns an error if the level cannot start a match.
pub fn verify_determinism(
    level: &LevelConfig,
    plan: &MatchPlan,
    runs: usize,
    max_ticks: u64,
) -> Result<DeterminismReport> {
    let results: Vec<(u64, u64)> = (0..runs)
        .into_par_iter()
        .map(|_| {
            let mut runner = MatchRunner::new(level, plan.clone())?.with_max_ticks(max_ticks);
            let report = runner.run();
            Ok((report.final_hash, report.ticks))
        })
        .collect::<Result<_>>()?;

    let (hashes, ticks) = results.into_iter().unzip();
    let report = DeterminismReport { runs, hashes, ticks };

    if report.is_deterministic() {
        info!(runs, "All runs agree");
    } else {
        warn!(runs, hashes = ?report.hashes, "Runs diverged");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlannedPlacement;
    use td_test_utils::fixtures::green_plains;

    #[test]
    fn test_runs_agree() {
        let plan = MatchPlan::idle()
            .with_placement(PlannedPlacement::new(0, "archer", 230.0, 180.0))
            .with_placement(PlannedPlacement::new(0, "archer", 570.0, 250.0));
        let report = verify_determinism(&green_plains(), &plan, 4, 5_000).unwrap();

        assert_eq!(report.runs, 4);
        assert_eq!(report.hashes.len(), 4);
        assert!(report.is_deterministic());
    }

    #[test]
    fn test_divergence_is_detected() {
        let report = DeterminismReport {
            runs: 2,
            hashes: vec![1, 2],
            ticks: vec![10, 10],
        };
        assert!(!report.is_deterministic());
    }

    #[test]
    fn test_invalid_level_is_an_error() {
        let mut level = green_plains();
        level.map.path.clear();
        assert!(verify_determinism(&level, &MatchPlan::idle(), 2, 10).is_err());
    }
}
