//! Combat rules.
//!
//! Everything here is a function over a [`Battlefield`]: legality checks
//! never mutate, and the two resolvers check legality before touching any
//! state, so a rejected action leaves the battlefield exactly as it was.
//!
//! Movement and attack reach are Manhattan diamonds. The area ability is a
//! Chebyshev square.
//!
//! # Example
//!
//! ```
//! use arena_core::prelude::*;
//! use arena_core::rules;
//!
//! let mut bf = Battlefield::default();
//! let sword = find_item("Sword").unwrap();
//! bf.place(Unit::new("Ada", sword, None).unwrap(), Team::One, Position::new(0, 0)).unwrap();
//! bf.place(Unit::new("Bo", sword, None).unwrap(), Team::Two, Position::new(1, 0)).unwrap();
//!
//! let events = rules::resolve_attack(&mut bf, Position::new(0, 0), Position::new(1, 0)).unwrap();
//! assert_eq!(events[0].damage(), 5);
//! ```

use crate::battlefield::Battlefield;
use crate::error::RuleViolation;
use crate::events::BattleEvent;
use crate::grid::Position;
use crate::unit::Unit;

/// Squares a unit may travel in one move.
pub const MOVE_BUDGET: i32 = 2;

/// Smallest damage any hit deals.
pub const MIN_DAMAGE: i32 = 1;

/// A move is legal when the destination is in bounds, empty, and no more
/// than [`MOVE_BUDGET`] Manhattan steps away.
#[must_use]
pub fn is_valid_move(bf: &Battlefield, from: Position, to: Position) -> bool {
    bf.is_empty_cell(to) && from.manhattan(to) <= MOVE_BUDGET
}

/// An attack is legal when the target cell is in bounds, holds a unit of
/// the other team, and lies within the attacker's effective range.
#[must_use]
pub fn is_valid_attack_target(bf: &Battlefield, from: Position, target: Position) -> bool {
    let (Some(attacker), Some(attacker_team)) = (bf.unit_at(from), bf.team_at(from)) else {
        return false;
    };
    match bf.team_at(target) {
        Some(team) if team != attacker_team => from.manhattan(target) <= attacker.effective_range(),
        _ => false,
    }
}

/// `max(1, attack - defense)`, summing both items on each side.
#[must_use]
pub fn calculate_damage(attacker: &Unit, defender: &Unit) -> i32 {
    (attacker.attack_power() - defender.defense()).max(MIN_DAMAGE)
}

/// Attack the unit on `target` with the unit on `from`.
///
/// The target loses health immediately and leaves the grid the moment its
/// health reaches zero.
///
/// # Errors
///
/// [`RuleViolation::IllegalAttack`] if the target fails
/// [`is_valid_attack_target`]. Nothing changes in that case.
pub fn resolve_attack(
    bf: &mut Battlefield,
    from: Position,
    target: Position,
) -> Result<Vec<BattleEvent>, RuleViolation> {
    let illegal = RuleViolation::IllegalAttack { from, target };
    if !is_valid_attack_target(bf, from, target) {
        return Err(illegal);
    }
    let (Some(attacker), Some(defender), Some(occupant)) =
        (bf.unit_at(from), bf.unit_at(target), bf.occupant(from))
    else {
        return Err(illegal);
    };
    let damage = calculate_damage(attacker, defender);
    let attacker_name = attacker.name().to_string();
    let defender_name = defender.name().to_string();

    let Some(report) = bf.apply_damage(target, damage) else {
        return Err(illegal);
    };
    tracing::debug!(
        attacker = %attacker_name,
        defender = %defender_name,
        damage,
        remaining = report.remaining,
        "Attack resolved"
    );

    let mut events = vec![BattleEvent::Attacked {
        attacker: occupant.unit,
        team: occupant.team,
        target,
        damage,
        remaining: report.remaining,
    }];
    if report.defeated {
        tracing::debug!(unit = %defender_name, at = %target, "Unit defeated");
        events.push(BattleEvent::UnitDefeated {
            unit: report.unit,
            team: report.team,
            at: target,
        });
    }
    Ok(events)
}

/// Cells covered by an area blast of `radius` around `center`, row by row,
/// clipped to the grid.
#[must_use]
pub fn area_cells(bf: &Battlefield, center: Position, radius: i32) -> Vec<Position> {
    let mut cells = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let pos = center.offset(dx, dy);
            if bf.is_valid_position(pos) {
                cells.push(pos);
            }
        }
    }
    cells
}

/// Use the area ability of the unit on `at`.
///
/// Every enemy inside the Chebyshev square of the ability's radius takes
/// normal damage from the caster. Hits are applied one at a time in row
/// order and each may defeat its target.
///
/// # Errors
///
/// - [`RuleViolation::IllegalAttack`] if `at` holds no unit
/// - [`RuleViolation::NoSpecialAbility`] if the unit has no area item
pub fn resolve_area_ability(
    bf: &mut Battlefield,
    at: Position,
) -> Result<Vec<BattleEvent>, RuleViolation> {
    let (Some(caster), Some(occupant)) = (bf.unit_at(at).cloned(), bf.occupant(at)) else {
        return Err(RuleViolation::IllegalAttack { from: at, target: at });
    };
    let radius = caster
        .area_radius()
        .ok_or_else(|| RuleViolation::NoSpecialAbility(caster.name().to_string()))?;

    let mut events = Vec::new();
    for pos in area_cells(bf, at, radius) {
        let Some(target) = bf.occupant(pos) else {
            continue;
        };
        if target.team == occupant.team {
            continue;
        }
        let Some(defender) = bf.unit_at(pos) else {
            continue;
        };
        let damage = calculate_damage(&caster, defender);
        let Some(report) = bf.apply_damage(pos, damage) else {
            continue;
        };
        tracing::debug!(
            caster = %caster.name(),
            target = %pos,
            damage,
            remaining = report.remaining,
            "Area hit"
        );
        events.push(BattleEvent::AreaHit {
            caster: occupant.unit,
            team: occupant.team,
            target: pos,
            damage,
            remaining: report.remaining,
        });
        if report.defeated {
            events.push(BattleEvent::UnitDefeated {
                unit: report.unit,
                team: report.team,
                at: pos,
            });
        }
    }
    Ok(events)
}

/// Cells the unit on `from` could move to this turn.
#[must_use]
pub fn reachable_cells(bf: &Battlefield, from: Position) -> Vec<Position> {
    diamond(from, MOVE_BUDGET)
        .filter(|&to| is_valid_move(bf, from, to))
        .collect()
}

/// In-bounds cells within the effective range of the unit on `from`,
/// whether or not anyone stands there. Empty when the cell is empty.
#[must_use]
pub fn attack_range_cells(bf: &Battlefield, from: Position) -> Vec<Position> {
    let Some(unit) = bf.unit_at(from) else {
        return Vec::new();
    };
    diamond(from, unit.effective_range())
        .filter(|&pos| bf.is_valid_position(pos))
        .collect()
}

/// Enemy cells the unit on `from` could attack right now.
#[must_use]
pub fn attackable_targets(bf: &Battlefield, from: Position) -> Vec<Position> {
    let Some(team) = bf.team_at(from) else {
        return Vec::new();
    };
    bf.positions(team.opponent())
        .iter()
        .filter(|&target| is_valid_attack_target(bf, from, target))
        .collect()
}

fn diamond(center: Position, reach: i32) -> impl Iterator<Item = Position> {
    (-reach..=reach).flat_map(move |dy| {
        (-reach..=reach)
            .map(move |dx| center.offset(dx, dy))
            .filter(move |&pos| center.manhattan(pos) <= reach)
    })
}
