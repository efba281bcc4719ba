//! Scripted match plans.
//!
//! A plan lists tower placements to make at given ticks, plus optional ticks
//! at which to call the next wave early. Plans are authored in RON:
//!
//! ```ron
//! (
//!     name: "two archers",
//!     placements: [
//!         (at_tick: 0, tower: "archer", x: 230.0, y: 180.0),
//!         (at_tick: 40, tower: "archer", x: 570.0, y: 250.0),
//!     ],
//!     early_waves: [100],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for plan operations.
#[derive(Error, Debug)]
pub enum PlanError {
    /// File not found.
    #[error("Plan file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read plan file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse plan: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// One scripted placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPlacement {
    /// Tick before which the placement is attempted.
    pub at_tick: u64,
    /// Tower archetype id.
    pub tower: String,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl PlannedPlacement {
    /// Create a placement.
    pub fn new(at_tick: u64, tower: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            at_tick,
            tower: tower.into(),
            x,
            y,
        }
    }
}

/// A scripted set of inputs for one match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchPlan {
    /// Plan name.
    #[serde(default)]
    pub name: String,
    /// Placements to attempt.
    #[serde(default)]
    pub placements: Vec<PlannedPlacement>,
    /// Ticks at which to start the next wave without waiting.
    #[serde(default)]
    pub early_waves: Vec<u64>,
}

impl MatchPlan {
    /// A plan that does nothing.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            name: "idle".to_string(),
            ..Self::default()
        }
    }

    /// Load a plan from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PlanError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PlanError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, PlanError> {
        let mut plan: Self = ron::from_str(ron)?;
        plan.normalize();
        Ok(plan)
    }

    /// Add a placement, keeping placements in tick order.
    #[must_use]
    pub fn with_placement(mut self, placement: PlannedPlacement) -> Self {
        self.placements.push(placement);
        self.normalize();
        self
    }

    /// Add an early wave call.
    #[must_use]
    pub fn with_early_wave(mut self, at_tick: u64) -> Self {
        self.early_waves.push(at_tick);
        self.normalize();
        self
    }

    /// Placements due at `tick`, in authored order.
    pub fn placements_at(&self, tick: u64) -> impl Iterator<Item = &PlannedPlacement> {
        self.placements.iter().filter(move |p| p.at_tick == tick)
    }

    /// Whether an early wave is called at `tick`.
    #[must_use]
    pub fn calls_wave_at(&self, tick: u64) -> bool {
        self.early_waves.binary_search(&tick).is_ok()
    }

    /// Last tick at which the plan does anything.
    #[must_use]
    pub fn last_tick(&self) -> Option<u64> {
        let placements = self.placements.last().map(|p| p.at_tick);
        let waves = self.early_waves.last().copied();
        placements.max(waves)
    }

    // Stable sort keeps same-tick placements in authored order.
    fn normalize(&mut self) {
        self.placements.sort_by_key(|p| p.at_tick);
        self.early_waves.sort_unstable();
        self.early_waves.dedup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan() {
        let plan = MatchPlan::from_ron_str(
            r#"(
                name: "pair",
                placements: [
                    (at_tick: 40, tower: "archer", x: 570.0, y: 250.0),
                    (at_tick: 0, tower: "archer", x: 230.0, y: 180.0),
                ],
                early_waves: [100, 20, 100],
            )"#,
        )
        .unwrap();

        assert_eq!(plan.name, "pair");
        assert_eq!(plan.placements[0].at_tick, 0);
        assert_eq!(plan.placements[1].at_tick, 40);
        assert_eq!(plan.early_waves, vec![20, 100]);
        assert_eq!(plan.last_tick(), Some(100));
    }

    #[test]
    fn test_defaults() {
        let plan = MatchPlan::from_ron_str(r#"(name: "empty")"#).unwrap();
        assert!(plan.placements.is_empty());
        assert_eq!(plan.last_tick(), None);
    }

    #[test]
    fn test_placements_at() {
        let plan = MatchPlan::idle()
            .with_placement(PlannedPlacement::new(5, "archer", 1.0, 2.0))
            .with_placement(PlannedPlacement::new(5, "ziggurat", 3.0, 4.0))
            .with_early_wave(9);

        let due: Vec<_> = plan.placements_at(5).map(|p| p.tower.as_str()).collect();
        assert_eq!(due, vec!["archer", "ziggurat"]);
        assert_eq!(plan.placements_at(6).count(), 0);
        assert!(plan.calls_wave_at(9));
        assert!(!plan.calls_wave_at(5));
    }

    #[test]
    fn test_bad_ron() {
        assert!(matches!(
            MatchPlan::from_ron_str("(placements: 3)"),
            Err(PlanError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            MatchPlan::load("/no/such/plan.ron"),
            Err(PlanError::FileNotFound(_))
        ));
    }
}
