//! Wave scheduling.
//!
//! The scheduler holds no clock. The match tells it the current time with
//! [`WaveScheduler::advance_to`] and gets back every wave start, spawn and
//! group exhaustion that fell due since the previous call, in time order.
//!
//! A wave's spawn groups run side by side. Each group spawns its first unit
//! the moment the wave starts, then one more every `interval` seconds, so the
//! k-th spawn of a group is due at `start + k * interval`.

use tracing::warn;

use crate::archetype::EnemyArchetype;
use crate::data::WaveData;
use crate::error::Result;
use crate::math::{to_fixed, Fixed};

/// One spawn group ready to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveGroup {
    /// Index into the match's enemy archetype table.
    pub archetype: usize,
    /// Units to spawn, always at least one.
    pub count: u32,
    /// Seconds between spawns, already floored to the minimum.
    pub interval: Fixed,
}

/// A wave ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavePlan {
    /// Authored wave number.
    pub number: u32,
    /// Groups that will actually spawn something.
    pub groups: Vec<WaveGroup>,
}

impl WavePlan {
    /// Units this wave will spawn.
    #[must_use]
    pub fn total_spawns(&self) -> u32 {
        self.groups
            .iter()
            .fold(0u32, |acc, group| acc.saturating_add(group.count))
    }
}

/// Resolve authored waves against the level's enemy archetypes.
///
/// Groups with a zero count contribute nothing and are dropped. Groups naming
/// an unknown enemy are dropped with a warning so one bad entry cannot stall
/// the match. Intervals are floored to `min_interval`.
///
/// # Errors
///
/// Returns [`GameError::InvalidLevelShape`](crate::error::GameError) if an
/// interval cannot be represented.
pub fn plan_waves(
    waves: &[WaveData],
    enemies: &[EnemyArchetype],
    min_interval: Fixed,
) -> Result<Vec<WavePlan>> {
    waves
        .iter()
        .map(|wave| {
            let mut groups = Vec::with_capacity(wave.spawns.len());
            for spawn in &wave.spawns {
                if spawn.count == 0 {
                    continue;
                }
                let Some(archetype) = enemies.iter().position(|e| e.id == spawn.enemy_type)
                else {
                    warn!(
                        wave = wave.number,
                        enemy_type = %spawn.enemy_type,
                        "Skipping spawn group with unknown enemy type"
                    );
                    continue;
                };
                let interval = to_fixed(spawn.spawn_interval, "spawn_interval")?.max(min_interval);
                groups.push(WaveGroup {
                    archetype,
                    count: spawn.count,
                    interval,
                });
            }
            Ok(WavePlan {
                number: wave.number,
                groups,
            })
        })
        .collect()
}

/// Something the scheduler produced while catching up to a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleEvent {
    /// Wave `index` began.
    WaveStarted {
        /// Zero-based wave index.
        index: usize,
    },
    /// Spawn one unit.
    Spawn {
        /// Group within the current wave.
        group: usize,
        /// Index into the match's enemy archetype table.
        archetype: usize,
    },
    /// A group spawned its last unit.
    GroupExhausted {
        /// Group within the current wave.
        group: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpawnTrack {
    group: usize,
    archetype: usize,
    count: u32,
    spawned: u32,
    interval: Fixed,
    started_at: Fixed,
}

impl SpawnTrack {
    fn next_due(&self) -> Fixed {
        self.started_at
            .saturating_add(self.interval.saturating_mul(Fixed::from_num(self.spawned)))
    }
}

/// Timed production of units for the current wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveScheduler {
    waves: Vec<WavePlan>,
    current: Option<usize>,
    pending_start: Option<(usize, Fixed)>,
    tracks: Vec<SpawnTrack>,
    halted: bool,
}

impl WaveScheduler {
    /// Create a scheduler with no wave started or scheduled.
    #[must_use]
    pub fn new(waves: Vec<WavePlan>) -> Self {
        Self {
            waves,
            current: None,
            pending_start: None,
            tracks: Vec::new(),
            halted: false,
        }
    }

    /// Number of waves.
    #[must_use]
    pub fn total_waves(&self) -> usize {
        self.waves.len()
    }

    /// All waves.
    #[must_use]
    pub fn waves(&self) -> &[WavePlan] {
        &self.waves
    }

    /// Index of the most recently started wave, `None` before the first.
    #[must_use]
    pub const fn current_wave(&self) -> Option<usize> {
        self.current
    }

    /// Index of the wave after the current one, if there is one.
    #[must_use]
    pub fn next_wave(&self) -> Option<usize> {
        let next = self.current.map_or(0, |index| index + 1);
        (next < self.waves.len()).then_some(next)
    }

    /// Wave waiting to start and when it is due.
    #[must_use]
    pub const fn pending_start(&self) -> Option<(usize, Fixed)> {
        self.pending_start
    }

    /// Groups of the current wave that still owe spawns.
    #[must_use]
    pub fn pending_groups(&self) -> usize {
        self.tracks.len()
    }

    /// Units of the current wave not yet spawned.
    #[must_use]
    pub fn pending_spawns(&self) -> u32 {
        self.tracks
            .iter()
            .fold(0u32, |acc, t| acc.saturating_add(t.count - t.spawned))
    }

    /// Whether [`halt`](Self::halt) has been called.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Whether the current wave is finished given how many units are alive.
    #[must_use]
    pub fn is_wave_complete(&self, live_units: usize) -> bool {
        self.tracks.is_empty() && live_units == 0
    }

    /// Schedule the next wave to begin at `at`.
    ///
    /// Returns `false` if there is no next wave, a start is already pending,
    /// or the scheduler is halted.
    pub fn schedule_next(&mut self, at: Fixed) -> bool {
        if self.halted || self.pending_start.is_some() {
            return false;
        }
        match self.next_wave() {
            Some(index) => {
                self.pending_start = Some((index, at));
                true
            }
            None => false,
        }
    }

    /// Pull a pending wave start forward to `now`.
    ///
    /// Returns `false` if no start is pending.
    pub fn start_pending_now(&mut self, now: Fixed) -> bool {
        match self.pending_start.as_mut() {
            Some((_, due)) if !self.halted => {
                *due = (*due).min(now);
                true
            }
            _ => false,
        }
    }

    /// Stop producing anything: no further waves or spawns.
    pub fn halt(&mut self) {
        self.halted = true;
        self.pending_start = None;
        self.tracks.clear();
    }

    /// Catch up to `now`, returning everything that fell due in time order.
    ///
    /// Spawns due at the same instant come out in group order.
    pub fn advance_to(&mut self, now: Fixed) -> Vec<ScheduleEvent> {
        let mut events = Vec::new();
        if self.halted {
            return events;
        }

        if let Some((index, due)) = self.pending_start {
            if due <= now {
                self.pending_start = None;
                self.begin_wave(index, due);
                events.push(ScheduleEvent::WaveStarted { index });
            }
        }

        loop {
            let next = self
                .tracks
                .iter()
                .enumerate()
                .filter(|(_, track)| track.next_due() <= now)
                .min_by_key(|(_, track)| (track.next_due(), track.group))
                .map(|(slot, _)| slot);
            let Some(slot) = next else {
                break;
            };

            let track = &mut self.tracks[slot];
            track.spawned += 1;
            events.push(ScheduleEvent::Spawn {
                group: track.group,
                archetype: track.archetype,
            });

            if track.spawned >= track.count {
                let group = track.group;
                self.tracks.remove(slot);
                events.push(ScheduleEvent::GroupExhausted { group });
            }
        }

        events
    }

    fn begin_wave(&mut self, index: usize, at: Fixed) {
        self.current = Some(index);
        self.tracks = self.waves.get(index).map_or_else(Vec::new, |wave| {
            wave.groups
                .iter()
                .enumerate()
                .map(|(group, spec)| SpawnTrack {
                    group,
                    archetype: spec.archetype,
                    count: spec.count,
                    spawned: 0,
                    interval: spec.interval,
                    started_at: at,
                })
                .collect()
        });
    }
}
