//! The match state machine.
//!
//! [`MatchState`] owns the economy, the units and towers, and the wave
//! scheduler, and advances them all in a fixed order each tick.
//!
//! # Tick order
//!
//! 1. **Schedule** - start due waves and spawn due units
//! 2. **Slowers** - every slow tower applies its aura
//! 3. **Attackers** - every attack tower may fire; kills pay out at once
//! 4. **Movement** - every live unit advances; escapes cost a life
//!
//! Slows applied in step 2 are visible to movement in step 4 of the same
//! tick. A unit killed in step 3 is gone before step 4, so it can never also
//! escape. Wave completion is checked after every kill, escape and group
//! exhaustion, and fires exactly once per wave.
//!
//! # Determinism
//!
//! - No floating-point math in the tick (uses [`Fixed`])
//! - Units are stored in spawn order; towers in placement order
//! - Equidistant targets resolve to the earliest spawned unit
//!
//! # Example
//!
//! ```
//! use td_core::data::LevelConfig;
//! use td_core::match_state::MatchState;
//! use td_core::rules::tick_dt;
//!
//! # let text = r#"{"id": 1, "name": "Demo", "start_gold": 100, "lives": 3,
//! #   "map": {"width": 400, "height": 300, "path": [{"x": 0, "y": 100}, {"x": 400, "y": 100}]},
//! #   "enemy_types": [{"id": "goblin", "name": "Goblin", "hp": 100, "speed": 60, "reward": 10, "slow_resistance": 0}],
//! #   "tower_types": [{"id": "archer", "name": "Archer", "type": "damage", "damage": 25,
//! #                    "attack_speed": 1.0, "range": 120, "cost": 50}],
//! #   "waves": [{"number": 1, "spawns": [{"enemy_type": "goblin", "count": 1, "spawn_interval": 1.0}]}]}"#;
//! let level = LevelConfig::from_json_str(text).unwrap();
//! let mut state = MatchState::new(&level).unwrap();
//!
//! state.place_tower_at("archer", 200.0, 160.0).unwrap();
//! while !state.is_terminal() {
//!     state.tick(tick_dt());
//! }
//! assert_eq!(state.score(), 10);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::archetype::{EnemyArchetype, TowerArchetype, TowerKindTag};
use crate::data::LevelConfig;
use crate::error::Result;
use crate::events::{MapPoint, MatchEvent, MatchStatus, TickEvents};
use crate::math::{clamp_fixed, square_wide, to_fixed, Fixed, Vec2Fixed};
use crate::path::PathProfile;
use crate::rules::ResolvedRules;
use crate::tower::{Tower, TowerBehavior, TowerId};
use crate::unit::{Unit, UnitId};
use crate::waves::{plan_waves, ScheduleEvent, WaveScheduler};

/// Why a tower placement was refused.
///
/// These are ordinary outcomes, not failures: nothing changes when a
/// placement is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementError {
    /// The match has already ended.
    #[error("the match is over")]
    MatchOver,
    /// The point lies outside the map.
    #[error("position is outside the map")]
    OutOfBounds,
    /// The point is inside the no-build zone around the route.
    #[error("position is too close to the road")]
    OnRoad,
    /// The point is too close to an existing tower.
    #[error("position is too close to another tower")]
    TooClose,
    /// No tower archetype has the requested id.
    #[error("unknown tower archetype")]
    UnknownArchetype,
    /// Not enough gold.
    #[error("not enough gold")]
    InsufficientFunds,
}

/// Read-only end-of-match record for result submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Level played.
    pub level_id: u32,
    /// Final score.
    pub score: u64,
    /// Waves cleared.
    pub waves_completed: u32,
    /// Whole seconds played.
    pub time_played_seconds: u64,
    /// Final state.
    pub outcome: MatchStatus,
}

/// A unit as the HUD sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit handle.
    pub id: UnitId,
    /// Enemy archetype id.
    pub archetype: String,
    /// Map position.
    pub position: MapPoint,
    /// Distance along the route.
    pub distance: f64,
    /// Health as a fraction of max.
    pub health_fraction: f64,
    /// Active slow strength.
    pub slow: f64,
}

/// A tower as the HUD sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerView {
    /// Tower handle.
    pub id: TowerId,
    /// Tower archetype id.
    pub archetype: String,
    /// Tower variant.
    pub kind: TowerKindTag,
    /// Map position.
    pub position: MapPoint,
    /// Effect radius.
    pub range: f64,
}

/// Read-only view of the whole match for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Ticks simulated.
    pub tick: u64,
    /// Gold balance.
    pub gold: u32,
    /// Lives left.
    pub lives: u32,
    /// Score so far.
    pub score: u64,
    /// Seconds of play simulated.
    pub elapsed_seconds: f64,
    /// Current wave number, 1-based; 0 before the first wave.
    pub wave: usize,
    /// Number of waves in the level.
    pub total_waves: usize,
    /// Seconds until the next wave starts, if one is scheduled.
    pub next_wave_in: Option<f64>,
    /// Match state.
    pub outcome: MatchStatus,
    /// Live units in spawn order.
    pub units: Vec<UnitView>,
    /// Towers in placement order.
    pub towers: Vec<TowerView>,
}

/// A running match.
#[derive(Debug, Clone)]
pub struct MatchState {
    level_id: u32,
    rules: ResolvedRules,
    width: Fixed,
    height: Fixed,
    path: PathProfile,
    enemy_types: Vec<EnemyArchetype>,
    tower_types: Vec<TowerArchetype>,
    scheduler: WaveScheduler,
    units: Vec<Unit>,
    towers: Vec<Tower>,
    gold: u32,
    lives: u32,
    score: u64,
    elapsed: Fixed,
    tick: u64,
    wave_in_progress: bool,
    waves_completed: usize,
    status: MatchStatus,
    next_unit_id: u32,
    next_tower_id: u32,
    pending_events: Vec<MatchEvent>,
}

impl MatchState {
    /// Build a match from a level.
    ///
    /// The first wave is scheduled to start after the rules' first-wave delay.
    /// A level without waves is won on the spot.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidPath`](crate::error::GameError) for an
    /// unusable route and
    /// [`GameError::InvalidLevelShape`](crate::error::GameError) for numbers
    /// that cannot be represented.
    pub fn new(level: &LevelConfig) -> Result<Self> {
        let rules = level.rules.resolve()?;
        let path = PathProfile::new(&level.route_points()?)?;
        let enemy_types = level
            .enemy_types
            .iter()
            .map(EnemyArchetype::from_data)
            .collect::<Result<Vec<_>>>()?;
        let tower_types = level
            .tower_types
            .iter()
            .map(TowerArchetype::from_data)
            .collect::<Result<Vec<_>>>()?;
        let waves = plan_waves(&level.waves, &enemy_types, rules.min_spawn_interval)?;

        let mut state = Self {
            level_id: level.id,
            rules,
            width: to_fixed(level.map.width, "map width")?,
            height: to_fixed(level.map.height, "map height")?,
            path,
            enemy_types,
            tower_types,
            scheduler: WaveScheduler::new(waves),
            units: Vec::new(),
            towers: Vec::new(),
            gold: level.start_gold,
            lives: level.lives,
            score: 0,
            elapsed: Fixed::ZERO,
            tick: 0,
            wave_in_progress: false,
            waves_completed: 0,
            status: MatchStatus::Playing,
            next_unit_id: 0,
            next_tower_id: 0,
            pending_events: Vec::new(),
        };

        let first_wave_at = state.rules.first_wave_delay;
        if !state.scheduler.schedule_next(first_wave_at) {
            let mut events = std::mem::take(&mut state.pending_events);
            state.finish(MatchStatus::Victory, &mut events);
            state.pending_events = events;
        }

        debug!(
            level = level.id,
            waves = state.scheduler.total_waves(),
            gold = state.gold,
            lives = state.lives,
            "Match created"
        );
        Ok(state)
    }

    /// Level identifier.
    #[must_use]
    pub const fn level_id(&self) -> u32 {
        self.level_id
    }

    /// Match tuning in effect.
    #[must_use]
    pub const fn rules(&self) -> &ResolvedRules {
        &self.rules
    }

    /// The route.
    #[must_use]
    pub const fn path(&self) -> &PathProfile {
        &self.path
    }

    /// Map width.
    #[must_use]
    pub const fn width(&self) -> Fixed {
        self.width
    }

    /// Map height.
    #[must_use]
    pub const fn height(&self) -> Fixed {
        self.height
    }

    /// Enemy archetypes, indexed by [`Unit::archetype`].
    #[must_use]
    pub fn enemy_types(&self) -> &[EnemyArchetype] {
        &self.enemy_types
    }

    /// Tower archetypes, indexed by [`Tower::archetype`].
    #[must_use]
    pub fn tower_types(&self) -> &[TowerArchetype] {
        &self.tower_types
    }

    /// Wave scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &WaveScheduler {
        &self.scheduler
    }

    /// Live units in spawn order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Towers in placement order.
    #[must_use]
    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    /// Gold balance.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Lives left.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Score so far.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Seconds of play simulated.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Ticks simulated.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Match state.
    #[must_use]
    pub const fn status(&self) -> MatchStatus {
        self.status
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Zero-based index of the current wave, `None` before the first.
    #[must_use]
    pub const fn current_wave(&self) -> Option<usize> {
        self.scheduler.current_wave()
    }

    /// Number of waves in the level.
    #[must_use]
    pub fn total_waves(&self) -> usize {
        self.scheduler.total_waves()
    }

    /// Waves cleared so far.
    #[must_use]
    pub const fn waves_completed(&self) -> usize {
        self.waves_completed
    }

    /// Whether a wave is running.
    #[must_use]
    pub const fn wave_in_progress(&self) -> bool {
        self.wave_in_progress
    }

    /// Find a live unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id() == id)
    }

    /// Advance the match by `dt` seconds.
    ///
    /// `dt` is clamped to `[0, max_tick_dt]`. Returns this tick's events,
    /// preceded by any placements made since the previous tick. Once the
    /// match is over, ticking does nothing.
    pub fn tick(&mut self, dt: Fixed) -> TickEvents {
        let mut events = std::mem::take(&mut self.pending_events);
        if self.is_terminal() {
            return TickEvents {
                tick: self.tick,
                events,
            };
        }

        let dt = clamp_fixed(dt, Fixed::ZERO, self.rules.max_tick_dt);
        self.tick += 1;
        self.elapsed = self.elapsed.saturating_add(dt);

        // 1. Waves and spawns
        self.run_schedule(&mut events);

        // 2. Slow auras
        if !self.is_terminal() {
            self.run_slowers();
        }

        // 3. Attacks
        if !self.is_terminal() {
            self.run_attackers(dt, &mut events);
        }

        // 4. Movement
        if !self.is_terminal() {
            self.run_movement(dt, &mut events);
        }

        #[cfg(feature = "debug-validation")]
        self.check_invariants();

        #[cfg(debug_assertions)]
        tracing::trace!(tick = self.tick, state_hash = self.state_hash(), "Match state hash");

        TickEvents {
            tick: self.tick,
            events,
        }
    }

    /// Check whether `tower` could be placed at `position` right now.
    ///
    /// Runs the same checks as [`place_tower`](Self::place_tower) without
    /// changing anything, in this order: match over, bounds, road, spacing,
    /// archetype, funds. Returns the archetype's index on success.
    ///
    /// # Errors
    ///
    /// Returns the first [`PlacementError`] that applies.
    pub fn check_placement(
        &self,
        tower: &str,
        position: Vec2Fixed,
    ) -> std::result::Result<usize, PlacementError> {
        if self.is_terminal() {
            return Err(PlacementError::MatchOver);
        }
        if position.x < Fixed::ZERO
            || position.y < Fixed::ZERO
            || position.x > self.width
            || position.y > self.height
        {
            return Err(PlacementError::OutOfBounds);
        }
        if self
            .path
            .is_within_radius(position, self.rules.no_build_radius)
        {
            return Err(PlacementError::OnRoad);
        }
        let spacing_squared = square_wide(self.rules.min_tower_spacing);
        if self
            .towers
            .iter()
            .any(|existing| existing.position().distance_squared(position) < spacing_squared)
        {
            return Err(PlacementError::TooClose);
        }
        let Some(index) = self.tower_types.iter().position(|t| t.id == tower) else {
            return Err(PlacementError::UnknownArchetype);
        };
        if self.gold < self.tower_types[index].cost {
            return Err(PlacementError::InsufficientFunds);
        }
        Ok(index)
    }

    /// Validate and place a tower in one step, paying its cost.
    ///
    /// The placement is reported as a [`MatchEvent::TowerPlaced`] at the
    /// start of the next tick's events.
    ///
    /// # Errors
    ///
    /// Returns a [`PlacementError`] and changes nothing if the placement is
    /// refused.
    pub fn place_tower(
        &mut self,
        tower: &str,
        position: Vec2Fixed,
    ) -> std::result::Result<TowerId, PlacementError> {
        let index = self.check_placement(tower, position)?;
        let archetype = &self.tower_types[index];

        self.gold -= archetype.cost;
        let id = TowerId(self.next_tower_id);
        self.next_tower_id += 1;

        let placed = Tower::new(
            id,
            index,
            archetype,
            position,
            self.rules.fallback_attack_cooldown,
        );
        debug!(
            tower = id.0,
            archetype = %archetype.id,
            gold = self.gold,
            "Tower placed"
        );
        self.pending_events.push(MatchEvent::TowerPlaced {
            tower: id,
            archetype: archetype.id.clone(),
            kind: placed.kind(),
            position: position.into(),
            gold_remaining: self.gold,
        });
        self.towers.push(placed);
        Ok(id)
    }

    /// [`place_tower`](Self::place_tower) with decimal coordinates.
    ///
    /// # Errors
    ///
    /// Non-finite or unrepresentable coordinates are
    /// [`PlacementError::OutOfBounds`]; otherwise as for `place_tower`.
    pub fn place_tower_at(
        &mut self,
        tower: &str,
        x: f64,
        y: f64,
    ) -> std::result::Result<TowerId, PlacementError> {
        let position = Self::decimal_position(x, y)?;
        self.place_tower(tower, position)
    }

    /// [`check_placement`](Self::check_placement) with decimal coordinates.
    ///
    /// # Errors
    ///
    /// As for [`place_tower_at`](Self::place_tower_at).
    pub fn check_placement_at(
        &self,
        tower: &str,
        x: f64,
        y: f64,
    ) -> std::result::Result<usize, PlacementError> {
        let position = Self::decimal_position(x, y)?;
        self.check_placement(tower, position)
    }

    /// Start the scheduled wave now instead of waiting out its delay.
    ///
    /// Returns `false` when the match is over, a wave is already running, or
    /// no wave is waiting.
    pub fn start_next_wave_now(&mut self) -> bool {
        if self.is_terminal() || self.wave_in_progress {
            return false;
        }
        self.scheduler.start_pending_now(self.elapsed)
    }

    /// End-of-match record. Meaningful once the match is over.
    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            level_id: self.level_id,
            score: self.score,
            waves_completed: u32::try_from(self.waves_completed).unwrap_or(u32::MAX),
            time_played_seconds: self.elapsed.floor().saturating_to_num::<u64>(),
            outcome: self.status,
        }
    }

    /// Read-only view for rendering.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        let units = self
            .units
            .iter()
            .map(|unit| UnitView {
                id: unit.id(),
                archetype: self.enemy_types[unit.archetype()].id.clone(),
                position: unit.position().into(),
                distance: unit.distance().to_num::<f64>(),
                health_fraction: unit.health_fraction(),
                slow: unit.slow().strength.to_num::<f64>(),
            })
            .collect();
        let towers = self
            .towers
            .iter()
            .map(|tower| TowerView {
                id: tower.id(),
                archetype: self.tower_types[tower.archetype()].id.clone(),
                kind: tower.kind(),
                position: tower.position().into(),
                range: tower.range().to_num::<f64>(),
            })
            .collect();

        MatchSnapshot {
            tick: self.tick,
            gold: self.gold,
            lives: self.lives,
            score: self.score,
            elapsed_seconds: self.elapsed.to_num::<f64>(),
            wave: self.current_wave().map_or(0, |index| index + 1),
            total_waves: self.total_waves(),
            next_wave_in: self
                .scheduler
                .pending_start()
                .map(|(_, due)| (due - self.elapsed).max(Fixed::ZERO).to_num::<f64>()),
            outcome: self.status,
            units,
            towers,
        }
    }

    /// Calculate a hash of the current match state.
    ///
    /// Two matches fed the same level and inputs produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.elapsed.to_bits().hash(&mut hasher);
        self.gold.hash(&mut hasher);
        self.lives.hash(&mut hasher);
        self.score.hash(&mut hasher);
        self.status.hash(&mut hasher);
        self.wave_in_progress.hash(&mut hasher);
        self.waves_completed.hash(&mut hasher);

        // Hash scheduler progress
        self.scheduler.current_wave().hash(&mut hasher);
        self.scheduler
            .pending_start()
            .map(|(index, due)| (index, due.to_bits()))
            .hash(&mut hasher);
        self.scheduler.pending_spawns().hash(&mut hasher);

        // Hash units in spawn order
        self.units.len().hash(&mut hasher);
        for unit in &self.units {
            unit.id().hash(&mut hasher);
            unit.health().hash(&mut hasher);
            unit.distance().to_bits().hash(&mut hasher);
            unit.position().x.to_bits().hash(&mut hasher);
            unit.position().y.to_bits().hash(&mut hasher);
            unit.slow().strength.to_bits().hash(&mut hasher);
            unit.slow().remaining.to_bits().hash(&mut hasher);
        }

        // Hash towers in placement order
        self.towers.len().hash(&mut hasher);
        for tower in &self.towers {
            tower.id().hash(&mut hasher);
            tower.archetype().hash(&mut hasher);
            tower.position().x.to_bits().hash(&mut hasher);
            tower.position().y.to_bits().hash(&mut hasher);
            if let TowerBehavior::Attacker { cooldown, .. } = tower.behavior() {
                cooldown.to_bits().hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    fn decimal_position(x: f64, y: f64) -> std::result::Result<Vec2Fixed, PlacementError> {
        match (to_fixed(x, "x"), to_fixed(y, "y")) {
            (Ok(x), Ok(y)) => Ok(Vec2Fixed::new(x, y)),
            _ => Err(PlacementError::OutOfBounds),
        }
    }

    fn run_schedule(&mut self, events: &mut Vec<MatchEvent>) {
        for scheduled in self.scheduler.advance_to(self.elapsed) {
            match scheduled {
                ScheduleEvent::WaveStarted { index } => {
                    self.wave_in_progress = true;
                    let number = self.scheduler.waves().get(index).map_or(0, |w| w.number);
                    debug!(wave = index, number, "Wave started");
                    events.push(MatchEvent::WaveStarted { index, number });
                    self.check_wave_complete(events);
                }
                ScheduleEvent::Spawn { archetype, .. } => {
                    let id = UnitId(self.next_unit_id);
                    self.next_unit_id += 1;
                    let stats = &self.enemy_types[archetype];
                    self.units
                        .push(Unit::spawn(id, archetype, stats, &self.path));
                    events.push(MatchEvent::UnitSpawned {
                        unit: id,
                        archetype: stats.id.clone(),
                    });
                }
                ScheduleEvent::GroupExhausted { .. } => self.check_wave_complete(events),
            }
            if self.is_terminal() {
                break;
            }
        }
    }

    fn run_slowers(&mut self) {
        for tower in &self.towers {
            tower.apply_aura(&mut self.units);
        }
    }

    fn run_attackers(&mut self, dt: Fixed, events: &mut Vec<MatchEvent>) {
        for index in 0..self.towers.len() {
            let tower = &mut self.towers[index];
            let Some(shot) = tower.attack(dt, &mut self.units) else {
                continue;
            };

            events.push(MatchEvent::TowerFired {
                tower: tower.id(),
                target: shot.target,
                from: shot.from.into(),
                to: shot.to.into(),
                killed: shot.killed,
            });

            if shot.killed {
                let unit = self.units.remove(shot.target_index);
                let reward = unit.reward();
                self.gold = self.gold.saturating_add(reward);
                self.score = self.score.saturating_add(u64::from(reward));
                debug!(unit = unit.id().0, reward, gold = self.gold, "Unit killed");
                events.push(MatchEvent::UnitKilled {
                    unit: unit.id(),
                    reward,
                });

                self.check_wave_complete(events);
                if self.is_terminal() {
                    return;
                }
            }
        }
    }

    fn run_movement(&mut self, dt: Fixed, events: &mut Vec<MatchEvent>) {
        let mut index = 0;
        while index < self.units.len() {
            if !self.units[index].advance(dt, &self.path) {
                index += 1;
                continue;
            }

            let unit = self.units.remove(index);
            self.lives = self.lives.saturating_sub(1);
            debug!(unit = unit.id().0, lives = self.lives, "Unit escaped");
            events.push(MatchEvent::UnitEscaped {
                unit: unit.id(),
                lives_remaining: self.lives,
            });

            if self.lives == 0 {
                self.finish(MatchStatus::GameOver, events);
                return;
            }
            self.check_wave_complete(events);
            if self.is_terminal() {
                return;
            }
        }
    }

    /// Fire wave completion once, when the running wave has nothing left.
    fn check_wave_complete(&mut self, events: &mut Vec<MatchEvent>) {
        if !self.wave_in_progress || self.is_terminal() {
            return;
        }
        if !self.scheduler.is_wave_complete(self.units.len()) {
            return;
        }

        self.wave_in_progress = false;
        let index = self.scheduler.current_wave().unwrap_or(0);
        self.waves_completed = (index + 1).min(self.scheduler.total_waves());
        debug!(wave = index, completed = self.waves_completed, "Wave completed");
        events.push(MatchEvent::WaveCompleted { index });

        let next_at = self.elapsed.saturating_add(self.rules.wave_settle_delay);
        if !self.scheduler.schedule_next(next_at) {
            self.finish(MatchStatus::Victory, events);
        }
    }

    fn finish(&mut self, outcome: MatchStatus, events: &mut Vec<MatchEvent>) {
        self.status = outcome;
        self.scheduler.halt();
        info!(
            outcome = ?outcome,
            score = self.score,
            waves_completed = self.waves_completed,
            lives = self.lives,
            "Match ended"
        );
        events.push(MatchEvent::MatchEnded { outcome });
    }

    #[cfg(feature = "debug-validation")]
    fn check_invariants(&self) {
        let total = self.path.total_length();
        for unit in &self.units {
            debug_assert!(unit.is_alive(), "non-live unit left in play");
            debug_assert!(unit.distance() <= total, "unit beyond route end");
            debug_assert!(
                unit.slow().strength <= crate::unit::MAX_SLOW_STRENGTH,
                "slow above cap"
            );
        }
        debug_assert!(
            self.waves_completed <= self.scheduler.total_waves(),
            "more waves completed than exist"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        DamageTowerData, EnemyData, MapData, PointData, SlowTowerData, SpawnData, TowerData,
        WaveData,
    };
    use crate::rules::{tick_dt, MatchRules};

    fn level(waves: Vec<WaveData>) -> LevelConfig {
        LevelConfig {
            id: 7,
            name: "Test Lane".to_string(),
            start_gold: 100,
            lives: 10,
            map: MapData {
                width: 800.0,
                height: 600.0,
                path: vec![PointData { x: 0.0, y: 300.0 }, PointData { x: 800.0, y: 300.0 }],
            },
            enemy_types: vec![EnemyData {
                id: "goblin".to_string(),
                name: "Goblin".to_string(),
                hp: 100,
                speed: 60.0,
                reward: 10,
                slow_resistance: 0.0,
            }],
            tower_types: vec![
                TowerData::Damage(DamageTowerData {
                    id: "archer".to_string(),
                    name: "Archer".to_string(),
                    damage: 25,
                    attack_speed: 1.0,
                    range: 120.0,
                    cost: 50,
                }),
                TowerData::Slow(SlowTowerData {
                    id: "ziggurat".to_string(),
                    name: "Ziggurat".to_string(),
                    slow_percent: 0.4,
                    slow_duration: 2.0,
                    range: 150.0,
                    cost: 70,
                }),
            ],
            waves,
            rules: MatchRules::default(),
        }
    }

    fn goblins(count: u32) -> WaveData {
        WaveData {
            number: 1,
            spawns: vec![SpawnData {
                enemy_type: "goblin".to_string(),
                count,
                spawn_interval: 1.0,
            }],
        }
    }

    fn run_until_terminal(state: &mut MatchState) -> Vec<MatchEvent> {
        let mut all = Vec::new();
        for _ in 0..100_000 {
            if state.is_terminal() {
                break;
            }
            all.extend(state.tick(tick_dt()).events);
        }
        all
    }

    #[test]
    fn test_initial_state() {
        let state = MatchState::new(&level(vec![goblins(1)])).unwrap();
        assert_eq!(state.gold(), 100);
        assert_eq!(state.lives(), 10);
        assert_eq!(state.score(), 0);
        assert_eq!(state.current_wave(), None);
        assert_eq!(state.status(), MatchStatus::Playing);
        assert!(!state.wave_in_progress());
    }

    #[test]
    fn test_first_wave_waits_for_delay() {
        let mut state = MatchState::new(&level(vec![goblins(1)])).unwrap();
        // 1.5s delay at 0.05s per tick: 29 ticks is not enough.
        for _ in 0..29 {
            state.tick(tick_dt());
        }
        assert_eq!(state.current_wave(), None);
        for _ in 0..2 {
            state.tick(tick_dt());
        }
        assert_eq!(state.current_wave(), Some(0));
        assert_eq!(state.units().len(), 1);
    }

    #[test]
    fn test_start_next_wave_now() {
        let mut state = MatchState::new(&level(vec![goblins(1)])).unwrap();
        assert!(state.start_next_wave_now());
        let events = state.tick(tick_dt());
        assert!(events
            .events
            .iter()
            .any(|e| matches!(e, MatchEvent::WaveStarted { index: 0, .. })));
        assert!(!state.start_next_wave_now());
    }

    #[test]
    fn test_zero_wave_level_is_won_immediately() {
        let mut state = MatchState::new(&level(vec![])).unwrap();
        assert_eq!(state.status(), MatchStatus::Victory);
        let events = state.tick(tick_dt());
        assert_eq!(events.outcome(), Some(MatchStatus::Victory));
        assert_eq!(state.get_tick(), 0);
    }

    #[test]
    fn test_placement_gate_order() {
        let mut state = MatchState::new(&level(vec![goblins(1)])).unwrap();

        assert_eq!(
            state.place_tower_at("archer", -1.0, 100.0),
            Err(PlacementError::OutOfBounds)
        );
        assert_eq!(
            state.place_tower_at("archer", f64::NAN, 100.0),
            Err(PlacementError::OutOfBounds)
        );
        // Road check comes before the archetype lookup.
        assert_eq!(
            state.place_tower_at("cannon", 100.0, 310.0),
            Err(PlacementError::OnRoad)
        );
        assert_eq!(
            state.place_tower_at("archer", 100.0, 324.0),
            Err(PlacementError::OnRoad)
        );
        assert_eq!(
            state.place_tower_at("cannon", 100.0, 400.0),
            Err(PlacementError::UnknownArchetype)
        );

        assert_eq!(state.place_tower_at("archer", 100.0, 400.0), Ok(TowerId(0)));
        assert_eq!(state.gold(), 50);
        assert_eq!(
            state.place_tower_at("archer", 120.0, 400.0),
            Err(PlacementError::TooClose)
        );
        assert_eq!(
            state.place_tower_at("ziggurat", 300.0, 400.0),
            Err(PlacementError::InsufficientFunds)
        );
        assert_eq!(state.place_tower_at("archer", 126.0, 400.0), Ok(TowerId(1)));
        assert_eq!(state.gold(), 0);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut state = MatchState::new(&level(vec![goblins(1)])).unwrap();
        assert!(state.check_placement_at("archer", 0.0, 0.0).is_ok());
        assert!(state.check_placement_at("archer", 800.0, 600.0).is_ok());
        assert_eq!(
            state.check_placement_at("archer", 800.5, 600.0),
            Err(PlacementError::OutOfBounds)
        );
        // Preview never spends.
        assert_eq!(state.gold(), 100);
        assert!(state.towers().is_empty());
        assert!(state.place_tower_at("archer", 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_placement_event_arrives_next_tick() {
        let mut state = MatchState::new(&level(vec![goblins(1)])).unwrap();
        state.place_tower_at("archer", 400.0, 380.0).unwrap();
        let events = state.tick(tick_dt());
        assert!(matches!(
            events.events.first(),
            Some(MatchEvent::TowerPlaced { gold_remaining: 50, .. })
        ));
    }

    #[test]
    fn test_single_tower_wins() {
        let mut state = MatchState::new(&level(vec![goblins(1)])).unwrap();
        state.place_tower_at("archer", 400.0, 330.0).unwrap();
        let events = run_until_terminal(&mut state);

        let shots = events
            .iter()
            .filter(|e| matches!(e, MatchEvent::TowerFired { .. }))
            .count();
        assert_eq!(shots, 4);
        assert_eq!(state.status(), MatchStatus::Victory);
        assert_eq!(state.gold(), 60);
        assert_eq!(state.score(), 10);
        assert_eq!(state.lives(), 10);
        assert_eq!(state.waves_completed(), 1);
    }

    #[test]
    fn test_lives_exhaustion() {
        let mut config = level(vec![goblins(3)]);
        config.lives = 1;
        let mut state = MatchState::new(&config).unwrap();
        let events = run_until_terminal(&mut state);

        assert_eq!(state.status(), MatchStatus::GameOver);
        assert_eq!(state.lives(), 0);
        let escapes = events
            .iter()
            .filter(|e| matches!(e, MatchEvent::UnitEscaped { .. }))
            .count();
        assert_eq!(escapes, 1);
        assert_eq!(state.waves_completed(), 0);
    }

    #[test]
    fn test_terminal_is_sticky() {
        let mut config = level(vec![goblins(1)]);
        config.lives = 1;
        let mut state = MatchState::new(&config).unwrap();
        run_until_terminal(&mut state);

        let hash = state.state_hash();
        let tick = state.get_tick();
        let events = state.tick(tick_dt());
        assert!(events.events.is_empty());
        assert_eq!(state.get_tick(), tick);
        assert_eq!(state.state_hash(), hash);
        assert_eq!(
            state.place_tower_at("archer", 100.0, 400.0),
            Err(PlacementError::MatchOver)
        );
        assert!(!state.start_next_wave_now());
    }

    #[test]
    fn test_wave_completion_fires_once_per_wave() {
        let mut second = goblins(2);
        second.number = 2;
        let mut state = MatchState::new(&level(vec![goblins(3), second])).unwrap();
        let events = run_until_terminal(&mut state);

        let completions: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                MatchEvent::WaveCompleted { index } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(completions, vec![0, 1]);
        assert_eq!(state.status(), MatchStatus::Victory);
        assert_eq!(state.waves_completed(), 2);
        assert_eq!(state.lives(), 5);
    }

    fn group(enemy: &str, count: u32) -> SpawnData {
        SpawnData {
            enemy_type: enemy.to_string(),
            count,
            spawn_interval: 1.0,
        }
    }

    fn completions(events: &[MatchEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                MatchEvent::WaveCompleted { index } => Some(*index),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_unknown_group_is_skipped_beside_valid_one() {
        let mixed = WaveData {
            number: 1,
            spawns: vec![group("orc", 3), group("goblin", 2)],
        };
        let mut state = MatchState::new(&level(vec![mixed])).unwrap();
        let events = run_until_terminal(&mut state);

        let spawned: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                MatchEvent::UnitSpawned { archetype, .. } => Some(archetype.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(spawned, vec!["goblin", "goblin"]);
        assert_eq!(completions(&events), vec![0]);
        assert_eq!(state.status(), MatchStatus::Victory);
        assert_eq!(state.lives(), 8);
    }

    #[test]
    fn test_wave_without_spawnable_groups_completes_when_started() {
        let hollow = WaveData {
            number: 1,
            spawns: vec![group("orc", 3), group("goblin", 0)],
        };
        let mut last = goblins(1);
        last.number = 2;
        let mut state = MatchState::new(&level(vec![hollow, last])).unwrap();

        assert!(state.start_next_wave_now());
        let first = state.tick(tick_dt()).events;
        assert!(first
            .iter()
            .any(|e| matches!(e, MatchEvent::WaveStarted { index: 0, .. })));
        assert_eq!(completions(&first), vec![0]);
        assert!(state.units().is_empty());
        assert!(!state.wave_in_progress());
        assert_eq!(state.waves_completed(), 1);

        let rest = run_until_terminal(&mut state);
        assert_eq!(completions(&rest), vec![1]);
        assert_eq!(state.status(), MatchStatus::Victory);
        assert_eq!(state.waves_completed(), 2);
    }

    #[test]
    fn test_last_wave_without_spawnable_groups_is_victory() {
        let hollow = WaveData {
            number: 1,
            spawns: vec![group("orc", 3)],
        };
        let mut state = MatchState::new(&level(vec![hollow])).unwrap();

        assert!(state.start_next_wave_now());
        let events = state.tick(tick_dt());
        assert_eq!(completions(&events.events), vec![0]);
        assert_eq!(events.outcome(), Some(MatchStatus::Victory));
        assert_eq!(state.get_tick(), 1);
    }

    #[test]
    fn test_placement_on_a_long_route() {
        let mut config = level(vec![goblins(1)]);
        config.map.width = 60_000.0;
        config.map.path = vec![
            PointData { x: 0.0, y: 100.0 },
            PointData { x: 60_000.0, y: 100.0 },
        ];
        let mut state = MatchState::new(&config).unwrap();

        assert_eq!(state.path().total_length(), Fixed::from_num(60_000));
        assert_eq!(
            state.check_placement_at("archer", 55_000.0, 100.0),
            Err(PlacementError::OnRoad)
        );
        assert_eq!(
            state.place_tower_at("archer", 55_000.0, 120.0),
            Err(PlacementError::OnRoad)
        );
        assert_eq!(state.place_tower_at("archer", 55_000.0, 200.0), Ok(TowerId(0)));
        assert_eq!(
            state.place_tower_at("archer", 55_010.0, 200.0),
            Err(PlacementError::TooClose)
        );
    }

    #[test]
    fn test_slow_delays_escape() {
        let mut plain = MatchState::new(&level(vec![goblins(1)])).unwrap();
        let mut slowed = MatchState::new(&level(vec![goblins(1)])).unwrap();
        slowed.place_tower_at("ziggurat", 400.0, 420.0).unwrap();

        run_until_terminal(&mut plain);
        run_until_terminal(&mut slowed);
        assert!(slowed.get_tick() > plain.get_tick());
        assert!(slowed.summary().time_played_seconds >= plain.summary().time_played_seconds);
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let mut state = MatchState::new(&level(vec![goblins(1)])).unwrap();
        state.tick(Fixed::from_num(10));
        assert_eq!(state.elapsed(), state.rules().max_tick_dt);
        state.tick(Fixed::from_num(-1));
        assert_eq!(state.elapsed(), state.rules().max_tick_dt);
    }

    #[test]
    fn test_summary_and_snapshot() {
        let mut state = MatchState::new(&level(vec![goblins(1)])).unwrap();
        state.place_tower_at("archer", 400.0, 330.0).unwrap();
        state.start_next_wave_now();
        state.tick(tick_dt());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.wave, 1);
        assert_eq!(snapshot.total_waves, 1);
        assert_eq!(snapshot.units.len(), 1);
        assert_eq!(snapshot.units[0].archetype, "goblin");
        assert_eq!(snapshot.towers[0].kind, TowerKindTag::Attacker);
        assert_eq!(snapshot.next_wave_in, None);

        run_until_terminal(&mut state);
        let summary = state.summary();
        assert_eq!(summary.level_id, 7);
        assert_eq!(summary.outcome, MatchStatus::Victory);
        assert_eq!(summary.score, 10);
        assert_eq!(summary.waves_completed, 1);
    }

    #[test]
    fn test_state_hash_is_deterministic() {
        let mut a = MatchState::new(&level(vec![goblins(3)])).unwrap();
        let mut b = MatchState::new(&level(vec![goblins(3)])).unwrap();
        a.place_tower_at("archer", 400.0, 380.0).unwrap();
        b.place_tower_at("archer", 400.0, 380.0).unwrap();

        for _ in 0..200 {
            a.tick(tick_dt());
            b.tick(tick_dt());
            assert_eq!(a.state_hash(), b.state_hash());
        }
    }
}
