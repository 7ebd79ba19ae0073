//! Determinism testing utilities.
//!
//! Battles must replay identically: the AI breaks ties by roster order and
//! the core has no randomness, so the same armies and configuration always
//! produce the same battlefield after every round.
//!
//! Sources of non-determinism this harness is meant to catch:
//!
//! - **Hash iteration order**: grid and rosters are `Vec`s, never maps.
//! - **Order-dependent tie breaks**: changing roster order on removal would
//!   change which enemy the AI hits first.
//! - **Hidden state**: anything not captured by `state_hash` would let two
//!   identical-looking runs drift apart.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use arena_core::battle::Battle;
use arena_core::battlefield::Battlefield;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps simulated per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use arena_test_utils::determinism::verify_determinism;
/// use arena_test_utils::fixtures::{capped_config, skirmish};
///
/// let result = verify_determinism(
///     3,
///     20,
///     || skirmish(capped_config(20)),
///     |battle| { battle.play_round(); },
///     |battle| battle.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
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

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Run a battle to completion twice and compare the final hashes.
pub fn verify_battle_determinism<F>(setup_fn: F) -> bool
where
    F: Fn() -> Battle,
{
    let mut first = setup_fn();
    let mut second = setup_fn();
    let outcomes = (first.run(), second.run());
    outcomes.0 == outcomes.1
        && first.state_hash() == second.state_hash() && first.rounds_played() == second.rounds_played()
}

/// Run N battles on scoped threads and collect the final hashes.
///
/// # Panics
///
/// Panics if a battle thread panics.
pub fn run_parallel_battles<F>(setup_fn: F, num_battles: usize) -> Vec<u64>
where
    F: Fn() -> Battle + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| {
                s.spawn(|| {
                    let mut battle = setup_fn();
                    battle.run();
                    battle.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    })
}

/// Compare two runs round by round and report the first round whose hashes
/// differ, or `None` if they never do.
pub fn find_first_divergence<F>(setup_fn: F, max_rounds: u32) -> Option<u32>
where
    F: Fn() -> Battle,
{
    let mut one = setup_fn();
    let mut two = setup_fn();

    if one.state_hash() != two.state_hash() {
        return Some(0);
    }

    for round in 1..=max_rounds {
        one.play_round();
        two.play_round();

        if one.state_hash() != two.state_hash() {
            tracing::debug!(round, "Battles diverged");
            return Some(round);
        }
        if one.is_finished() && two.is_finished() {
            break;
        }
    }

    None
}

/// Verify that a bincode snapshot round-trip preserves the battlefield.
#[must_use]
pub fn verify_snapshot_determinism(bf: &Battlefield) -> bool {
    let Ok(bytes) = bf.serialize() else {
        return false;
    };
    let Ok(restored) = Battlefield::deserialize(&bytes) else {
        return false;
    };
    restored.state_hash() == bf.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for battle inputs.
pub mod strategies {
    use arena_core::army::UnitSpec;
    use arena_core::grid::{Position, MAX_GRID_HEIGHT, MAX_GRID_WIDTH};
    use arena_core::items::{ItemId, NUMBER_OF_ITEMS};
    use arena_core::unit::{Unit, SLOT_CAPACITY};
    use proptest::prelude::*;

    /// Any coordinate, including ones well outside the grid.
    pub fn arb_any_position() -> impl Strategy<Value = Position> {
        (-5i32..15, -5i32..15).prop_map(|(x, y)| Position::new(x, y))
    }

    /// A coordinate on the full-size grid.
    pub fn arb_grid_position() -> impl Strategy<Value = Position> {
        (0..MAX_GRID_WIDTH, 0..MAX_GRID_HEIGHT).prop_map(|(x, y)| Position::new(x, y))
    }

    /// Any catalog item.
    pub fn arb_item() -> impl Strategy<Value = ItemId> {
        (0..NUMBER_OF_ITEMS as i32).prop_filter_map("catalog index", ItemId::from_index)
    }

    /// A legal loadout: any primary, plus a secondary only if it fits.
    pub fn arb_loadout() -> impl Strategy<Value = (ItemId, Option<ItemId>)> {
        (arb_item(), proptest::option::of(arb_item())).prop_map(|(primary, secondary)| {
            let fits = |s: &ItemId| primary.item().slots + s.item().slots <= SLOT_CAPACITY;
            (primary, secondary.filter(fits))
        })
    }

    /// A unit with a legal loadout and health in `1..=100`.
    pub fn arb_unit() -> impl Strategy<Value = Unit> {
        ("[a-z]{1,12}", arb_loadout(), 1i32..=100).prop_filter_map(
            "legal unit",
            |(name, (primary, secondary), health)| {
                Unit::with_health(name, health, primary, secondary).ok()
            },
        )
    }

    /// An army of 1 to 5 units, as saved to disk.
    pub fn arb_army_units() -> impl Strategy<Value = Vec<Unit>> {
        proptest::collection::vec(arb_unit(), 1..=5)
    }

    /// Unit specs naming items the way a scenario file does.
    pub fn arb_unit_specs() -> impl Strategy<Value = Vec<UnitSpec>> {
        proptest::collection::vec(
            arb_loadout().prop_map(|(primary, secondary)| UnitSpec {
                name: primary.item().name.to_string(),
                primary: Some(primary.item().name.to_string()),
                secondary: secondary.map(|s| s.item().name.to_string()),
            }),
            1..=5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{capped_config, duel, skirmish};

    #[test]
    fn test_skirmish_is_deterministic() {
        verify_determinism(
            3,
            15,
            || skirmish(capped_config(40)),
            |battle| {
                battle.play_round();
            },
            Battle::state_hash,
        )
        .assert_deterministic();
    }

    #[test]
    fn test_full_battle_is_deterministic() {
        assert!(verify_battle_determinism(|| skirmish(capped_config(60))));
    }

    #[test]
    fn test_parallel_battles_agree() {
        let hashes = run_parallel_battles(|| skirmish(capped_config(60)), 4);
        assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(|| skirmish(capped_config(60)), 60), None);
    }

    #[test]
    fn test_snapshot_round_trip() {
        assert!(verify_snapshot_determinism(&duel("Sword", "Staff")));
    }

    #[test]
    fn test_unique_hashes() {
        let result = DeterminismResult {
            is_deterministic: false,
            hashes: vec![3, 1, 3],
            steps: 1,
        };
        assert_eq!(result.unique_hashes(), vec![1, 3]);
    }
}
