//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays store only inputs, so a match must be 100% reproducible.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`td_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units and towers live in vectors in creation order.
//!
//! - **System randomness**: The core has none.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual rules (movement, slows, attacks)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full matches are reproducible
//! 4. **Parallel tests**: Running N matches in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use td_core::data::LevelConfig;
use td_core::match_state::MatchState;
use td_core::math::Fixed;
use td_core::replay::{Replay, ReplayPlayer};
use td_core::rules::tick_dt;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the match was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel match runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each match.
    pub hashes: Vec<u64>,
    /// Number of ticks each match ran.
    pub ticks: u64,
    /// Number of matches run.
    pub num_runs: usize,
}

impl ParallelRunResult {
    /// Check if all matches produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all matches agreed.
    ///
    /// # Panics
    ///
    /// Panics if matches produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel matches diverged!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_runs,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use td_core::rules::tick_dt;
/// use td_test_utils::determinism::verify_determinism;
/// use td_test_utils::fixtures::defended_green_plains;
///
/// let result = verify_determinism(
///     3,
///     200,
///     defended_green_plains,
///     |state| {
///         state.tick(tick_dt());
///     },
///     |state| state.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a match twice with identical setup at the standard step and check
/// the final state hashes match exactly.
pub fn verify_match_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> MatchState,
{
    let dt = tick_dt();
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |state| {
            state.tick(dt);
        },
        MatchState::state_hash,
    )
    .is_deterministic
}

/// Run N matches on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling
/// or memory layout differences.
///
/// # Panics
///
/// Panics if a match thread panics.
pub fn run_parallel_matches<F>(setup_fn: F, num_runs: usize, num_ticks: u64) -> ParallelRunResult
where
    F: Fn() -> MatchState + Sync,
{
    let dt = tick_dt();
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let mut state = setup_fn();
                    for _ in 0..num_ticks {
                        state.tick(dt);
                    }
                    state.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("match thread panicked"))
            .collect()
    });

    ParallelRunResult {
        hashes,
        ticks: num_ticks,
        num_runs,
    }
}

/// Compare two match runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(tick)` at the first tick
/// whose hashes differ.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> MatchState,
{
    let dt = tick_dt();
    let mut first = setup_fn();
    let mut second = setup_fn();

    for tick in 0..num_ticks {
        if first.state_hash() != second.state_hash() {
            return Some(tick);
        }
        first.tick(dt);
        second.tick(dt);
    }

    if first.state_hash() == second.state_hash() {
        None
    } else {
        Some(num_ticks)
    }
}

/// Play `level` to the end with `dt`, applying `inputs` before the ticks
/// they name, while recording a replay.
///
/// Returns the finished state and its finalized replay.
///
/// # Panics
///
/// Panics if the level is invalid.
pub fn record_match(
    level: &LevelConfig,
    dt: Fixed,
    inputs: &[(u64, &str, f64, f64)],
    max_ticks: u64,
) -> (MatchState, Replay) {
    let mut state = MatchState::new(level).expect("level is valid");
    let mut replay = Replay::new(level, dt).expect("level serializes");

    while !state.is_terminal() && state.get_tick() < max_ticks {
        let now = state.get_tick();
        for &(_, tower, x, y) in inputs.iter().filter(|input| input.0 == now) {
            if let Ok(id) = state.place_tower_at(tower, x, y) {
                let position = state
                    .towers()
                    .iter()
                    .find(|placed| placed.id() == id)
                    .map(td_core::tower::Tower::position)
                    .expect("placed tower exists");
                replay.record_placement(now, tower, position);
            }
        }
        state.tick(dt);
    }

    replay.finalize(state.get_tick(), state.state_hash());
    (state, replay)
}

/// Record a match, push the replay through its byte form, and check the
/// playback lands on the recorded hash.
///
/// # Panics
///
/// Panics if the level is invalid or the replay fails to decode.
pub fn verify_replay_determinism(
    level: &LevelConfig,
    inputs: &[(u64, &str, f64, f64)],
    max_ticks: u64,
) -> bool {
    let (_, replay) = record_match(level, tick_dt(), inputs, max_ticks);
    let bytes = replay.to_bytes().expect("replay encodes");
    let loaded = Replay::from_bytes(&bytes).expect("replay decodes");
    let mut player = ReplayPlayer::new(loaded).expect("replay level is valid");
    player.verify().expect("replay plays back")
}

/// Compute a hash for any hashable value.
#[must_use]
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
