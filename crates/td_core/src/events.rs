//! Outbound notifications for the render and HUD layers.

use serde::{Deserialize, Serialize};

use crate::archetype::TowerKindTag;
use crate::math::Vec2Fixed;
use crate::tower::TowerId;
use crate::unit::UnitId;

/// Map position in plain decimals, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl From<Vec2Fixed> for MapPoint {
    fn from(value: Vec2Fixed) -> Self {
        let (x, y) = value.to_f64_pair();
        Self { x, y }
    }
}

/// Terminal or running state of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Still running.
    Playing,
    /// Every wave cleared with lives to spare.
    Victory,
    /// Lives ran out.
    GameOver,
}

impl MatchStatus {
    /// Whether the match has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

/// Something that happened in the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    /// A wave began spawning.
    WaveStarted {
        /// Zero-based wave index.
        index: usize,
        /// Authored wave number.
        number: u32,
    },
    /// A unit entered the route.
    UnitSpawned {
        /// New unit.
        unit: UnitId,
        /// Enemy archetype id.
        archetype: String,
    },
    /// A tower was placed.
    TowerPlaced {
        /// New tower.
        tower: TowerId,
        /// Tower archetype id.
        archetype: String,
        /// Tower variant.
        kind: TowerKindTag,
        /// Where it stands.
        position: MapPoint,
        /// Gold left after paying.
        gold_remaining: u32,
    },
    /// An attacker shot a unit.
    TowerFired {
        /// Shooter.
        tower: TowerId,
        /// Unit hit.
        target: UnitId,
        /// Start of the shot line.
        from: MapPoint,
        /// End of the shot line.
        to: MapPoint,
        /// Whether the shot was lethal.
        killed: bool,
    },
    /// A unit died; its reward was paid.
    UnitKilled {
        /// Dead unit.
        unit: UnitId,
        /// Gold and score granted.
        reward: u32,
    },
    /// A unit reached the end of the route and cost a life.
    UnitEscaped {
        /// Escaped unit.
        unit: UnitId,
        /// Lives after the loss.
        lives_remaining: u32,
    },
    /// Every unit of a wave has been spawned and is gone.
    WaveCompleted {
        /// Zero-based wave index.
        index: usize,
    },
    /// The match reached a terminal state.
    MatchEnded {
        /// Final state.
        outcome: MatchStatus,
    },
}

/// Events produced by one tick, including placements made since the
/// previous tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick counter after this tick.
    pub tick: u64,
    /// Events in the order they happened.
    pub events: Vec<MatchEvent>,
}

impl TickEvents {
    /// Units killed this tick.
    pub fn kills(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.events.iter().filter_map(|event| match event {
            MatchEvent::UnitKilled { unit, .. } => Some(*unit),
            _ => None,
        })
    }

    /// Units that escaped this tick.
    pub fn escapes(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.events.iter().filter_map(|event| match event {
            MatchEvent::UnitEscaped { unit, .. } => Some(*unit),
            _ => None,
        })
    }

    /// Number of shots fired this tick.
    #[must_use]
    pub fn shots(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, MatchEvent::TowerFired { .. }))
            .count()
    }

    /// Terminal state reached this tick, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<MatchStatus> {
        self.events.iter().find_map(|event| match event {
            MatchEvent::MatchEnded { outcome } => Some(*outcome),
            _ => None,
        })
    }
}
