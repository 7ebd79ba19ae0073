//! Test fixtures and helpers.
//!
//! Pre-built units, armies and boards for consistent testing.
//!
//! # Panics
//!
//! Every builder here panics on bad input (unknown item names, illegal
//! loadouts). Fixtures are test code: a typo should fail loudly.

use arena_core::army::{Army, UnitSpec};
use arena_core::battle::Battle;
use arena_core::battlefield::Battlefield;
use arena_core::config::BattleConfig;
use arena_core::grid::{Position, Team};
use arena_core::items::{find_item, ItemId};
use arena_core::unit::Unit;

/// Look up a catalog item by name.
///
/// # Panics
///
/// Panics if the name is not in the catalog.
#[must_use]
pub fn item(name: &str) -> ItemId {
    find_item(name).unwrap_or_else(|| panic!("unknown item {name:?}"))
}

/// Build a unit at full health.
///
/// # Panics
///
/// Panics on unknown items or a loadout over two slots.
#[must_use]
pub fn unit(name: &str, primary: &str, secondary: Option<&str>) -> Unit {
    Unit::new(name, item(primary), secondary.map(item))
        .unwrap_or_else(|err| panic!("bad fixture unit {name:?}: {err}"))
}

/// Build a unit with the given health.
///
/// # Panics
///
/// Panics on unknown items or a loadout over two slots.
#[must_use]
pub fn wounded(name: &str, primary: &str, secondary: Option<&str>, health: i32) -> Unit {
    Unit::with_health(name, health, item(primary), secondary.map(item))
        .unwrap_or_else(|err| panic!("bad fixture unit {name:?}: {err}"))
}

/// Army of single-item units, named `<prefix>1`, `<prefix>2`, ...
///
/// # Panics
///
/// Panics unless 1 to 5 valid items are given.
#[must_use]
pub fn army(prefix: &str, primaries: &[&str]) -> Army {
    let specs: Vec<_> = primaries
        .iter()
        .enumerate()
        .map(|(i, primary)| UnitSpec::new(format!("{prefix}{}", i + 1), *primary))
        .collect();
    Army::from_specs(&specs).unwrap_or_else(|err| panic!("bad fixture army: {err}"))
}

/// Army parsed from a RON list of unit specs.
///
/// # Panics
///
/// Panics if the text does not parse or the army is invalid.
#[must_use]
pub fn army_from_ron(text: &str) -> Army {
    let specs: Vec<UnitSpec> =
        ron::from_str(text).unwrap_or_else(|err| panic!("bad fixture RON: {err}"));
    Army::from_specs(&specs).unwrap_or_else(|err| panic!("bad fixture army: {err}"))
}

/// Two single-unit teams facing each other at Manhattan distance 1:
/// team 1 on `(0, 0)`, team 2 on `(1, 0)`.
///
/// # Panics
///
/// Panics on bad item names.
#[must_use]
pub fn duel(attacker: &str, defender: &str) -> Battlefield {
    let mut bf = Battlefield::default();
    bf.place(unit("attacker", attacker, None), Team::One, Position::new(0, 0))
        .unwrap_or_else(|err| panic!("{err}"));
    bf.place(unit("defender", defender, None), Team::Two, Position::new(1, 0))
        .unwrap_or_else(|err| panic!("{err}"));
    bf
}

/// A full 5-vs-5 AI battle in the default formation with a mixed loadout.
#[must_use]
pub fn skirmish(config: BattleConfig) -> Battle {
    Battle::new(
        config,
        army("red", &["Greatsword", "Crossbow", "Fireball Staff", "Spear", "Mace"]),
        army("blue", &["Hammer", "Bow", "Ice Staff", "Axe", "Lightning Rod"]),
    )
}

/// Default configuration with a round cap, so stalled AI battles end.
#[must_use]
pub fn capped_config(max_rounds: i32) -> BattleConfig {
    BattleConfig {
        max_rounds,
        ..BattleConfig::default()
    }
}
