//! The battle grid.
//!
//! The battlefield owns a fixed `W×H` grid of cells, the units placed on it,
//! and one [`Roster`] per team listing that team's occupied cells in
//! placement order.
//!
//! # Invariants
//!
//! For each team, the roster length, the number of cells tagged with the
//! team, and the team's live-unit count are the same number. The live-unit
//! count is not stored separately: it *is* the roster length, and every
//! mutation below updates grid and roster together.
//!
//! Enable the `debug-validation` feature to re-check these invariants after
//! every mutation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::army::Army;
use crate::error::{GameError, GridError, Result, RuleViolation};
use crate::grid::{Position, Team, MAX_GRID_HEIGHT, MAX_GRID_WIDTH};
use crate::roster::Roster;
use crate::rules;
use crate::unit::Unit;

/// Handle to a unit stored on the battlefield.
///
/// Ids stay valid after the unit is defeated and removed from the grid, so
/// renderers and event consumers can still look up its name.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct UnitId(u32);

impl UnitId {
    /// Raw storage index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Contents of an occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupant {
    /// Unit standing on the cell.
    pub unit: UnitId,
    /// Team the unit fights for.
    pub team: Team,
}

/// Result of applying damage to a placed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageReport {
    /// Unit that was hit.
    pub unit: UnitId,
    /// Its team.
    pub team: Team,
    /// Health after the hit.
    pub remaining: i32,
    /// Whether the hit removed the unit from the grid.
    pub defeated: bool,
}

/// The grid, its units and the per-team rosters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Battlefield {
    width: i32,
    height: i32,
    cells: Vec<Option<Occupant>>,
    rosters: [Roster; 2],
    units: Vec<Unit>,
}

impl Battlefield {
    /// Create an empty battlefield. Dimensions are clamped to
    /// `1..=10` on each axis.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.clamp(1, MAX_GRID_WIDTH);
        let height = height.clamp(1, MAX_GRID_HEIGHT);
        Self {
            width,
            height,
            cells: vec![None; (width * height) as usize],
            rosters: [Roster::new(), Roster::new()],
            units: Vec::new(),
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Bounds check: `0 <= x < W` and `0 <= y < H`.
    #[must_use]
    pub const fn is_valid_position(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    fn cell_index(&self, pos: Position) -> Option<usize> {
        self.is_valid_position(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// Place a unit for a team.
    ///
    /// # Errors
    ///
    /// Nothing changes and an error is returned when the position is out of
    /// bounds, the team already has five placed units, or the cell is taken.
    pub fn place(&mut self, unit: Unit, team: Team, pos: Position) -> std::result::Result<UnitId, GridError> {
        let index = self.cell_index(pos).ok_or(GridError::OutOfBounds(pos))?;
        if self.rosters[team.index()].is_full() {
            return Err(GridError::TeamFull(team));
        }
        if self.cells[index].is_some() {
            return Err(GridError::Occupied(pos));
        }

        let id = UnitId(self.units.len() as u32);
        self.units.push(unit);
        self.cells[index] = Some(Occupant { unit: id, team });
        self.rosters[team.index()].push(pos);

        tracing::debug!(unit = id.0, team = team.number(), x = pos.x, y = pos.y, "Unit placed");
        self.validate();
        Ok(id)
    }

    /// Clear a cell and drop its entry from the team roster, keeping the
    /// order of the remaining entries. Returns what stood there, or `None`
    /// (a no-op) for an empty or out-of-bounds cell.
    pub fn remove(&mut self, pos: Position) -> Option<Occupant> {
        let index = self.cell_index(pos)?;
        let occupant = self.cells[index].take()?;
        self.rosters[occupant.team.index()].remove(pos);

        tracing::debug!(
            unit = occupant.unit.0,
            team = occupant.team.number(),
            x = pos.x,
            y = pos.y,
            "Unit removed"
        );
        self.validate();
        Some(occupant)
    }

    /// Move the unit on `from` to `to`.
    ///
    /// The roster entry is rewritten in place (same index), then the unit
    /// and its team tag are relocated and `from` is cleared.
    ///
    /// # Errors
    ///
    /// - [`GridError::EmptyCell`] if `from` holds no unit
    /// - [`RuleViolation::IllegalMove`] if `to` fails the move rules
    pub fn move_unit(&mut self, from: Position, to: Position) -> Result<()> {
        let occupant = self.occupant(from).ok_or(GridError::EmptyCell(from))?;
        if !rules::is_valid_move(self, from, to) {
            return Err(RuleViolation::IllegalMove { from, to }.into());
        }
        let (Some(from_index), Some(to_index)) = (self.cell_index(from), self.cell_index(to))
        else {
            return Err(GameError::Grid(GridError::OutOfBounds(to)));
        };

        self.rosters[occupant.team.index()].relocate(from, to);
        self.cells[to_index] = Some(occupant);
        self.cells[from_index] = None;

        tracing::debug!(
            unit = occupant.unit.0,
            from = %from,
            to = %to,
            "Unit moved"
        );
        self.validate();
        Ok(())
    }

    /// Subtract damage from the unit on `pos`. A unit whose health drops to
    /// zero or below is removed from the grid immediately.
    ///
    /// Returns `None` if the cell is empty.
    pub fn apply_damage(&mut self, pos: Position, damage: i32) -> Option<DamageReport> {
        let occupant = self.occupant(pos)?;
        let remaining = self.units[occupant.unit.index()].take_damage(damage);
        let defeated = remaining <= 0;
        if defeated {
            self.remove(pos);
        }
        Some(DamageReport {
            unit: occupant.unit,
            team: occupant.team,
            remaining,
            defeated,
        })
    }

    /// Contents of a cell, if occupied and in bounds.
    #[must_use]
    pub fn occupant(&self, pos: Position) -> Option<Occupant> {
        self.cell_index(pos).and_then(|i| self.cells[i])
    }

    /// Team holding a cell.
    #[must_use]
    pub fn team_at(&self, pos: Position) -> Option<Team> {
        self.occupant(pos).map(|o| o.team)
    }

    /// Unit standing on a cell.
    #[must_use]
    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.occupant(pos).map(|o| &self.units[o.unit.index()])
    }

    /// Whether the cell is in bounds and free.
    #[must_use]
    pub fn is_empty_cell(&self, pos: Position) -> bool {
        self.is_valid_position(pos) && self.occupant(pos).is_none()
    }

    /// Look up a unit by id, placed or not.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.index())
    }

    /// Where a unit currently stands, if it is placed.
    #[must_use]
    pub fn position_of(&self, id: UnitId) -> Option<Position> {
        Team::ALL.iter().find_map(|&team| {
            self.rosters[team.index()]
                .iter()
                .find(|&pos| self.occupant(pos).is_some_and(|o| o.unit == id))
        })
    }

    /// Ordered roster of a team.
    #[must_use]
    pub fn positions(&self, team: Team) -> &Roster {
        &self.rosters[team.index()]
    }

    /// Number of placed, undefeated units of a team.
    #[must_use]
    pub fn unit_count(&self, team: Team) -> usize {
        self.rosters[team.index()].len()
    }

    /// A team's placed units in roster order.
    pub fn units_of(&self, team: Team) -> impl Iterator<Item = (Position, UnitId, &Unit)> + '_ {
        self.rosters[team.index()].iter().filter_map(move |pos| {
            self.occupant(pos)
                .map(|o| (pos, o.unit, &self.units[o.unit.index()]))
        })
    }

    /// Place an army in the default formation: team 1 on the left column,
    /// team 2 on the right column, one unit every other row.
    ///
    /// Units that do not fit (short grid) are skipped with a warning.
    pub fn deploy(&mut self, team: Team, army: Army) -> Vec<UnitId> {
        let x = match team {
            Team::One => 0,
            Team::Two => self.width - 1,
        };
        army.into_units()
            .into_iter()
            .enumerate()
            .filter_map(|(i, unit)| {
                let pos = Position::new(x, i as i32 * 2);
                match self.place(unit, team, pos) {
                    Ok(id) => Some(id),
                    Err(err) => {
                        tracing::warn!(team = team.number(), error = %err, "Unit could not be deployed");
                        None
                    }
                }
            })
            .collect()
    }

    /// Check that rosters and grid agree. Returns a description of the first
    /// mismatch found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for team in Team::ALL {
            let roster = &self.rosters[team.index()];
            let tagged = self
                .cells
                .iter()
                .flatten()
                .filter(|o| o.team == team)
                .count();
            if tagged != roster.len() {
                return Err(format!(
                    "{team}: {tagged} tagged cells but roster lists {}",
                    roster.len()
                ));
            }
            for pos in roster {
                if self.team_at(pos) != Some(team) {
                    return Err(format!("{team}: roster lists {pos} but the cell disagrees"));
                }
            }
        }

        let mut seen: Vec<UnitId> = self.cells.iter().flatten().map(|o| o.unit).collect();
        let placed = seen.len();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != placed {
            return Err("a unit occupies more than one cell".to_string());
        }
        Ok(())
    }

    #[cfg(feature = "debug-validation")]
    fn validate(&self) {
        if let Err(problem) = self.check_invariants() {
            panic!("battlefield invariant broken: {problem}");
        }
    }

    #[cfg(not(feature = "debug-validation"))]
    #[inline]
    fn validate(&self) {}

    /// Hash of the full battlefield state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the battlefield for snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> std::result::Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Restore a battlefield snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid snapshot.
    pub fn deserialize(data: &[u8]) -> std::result::Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

impl Default for Battlefield {
    fn default() -> Self {
        Self::new(MAX_GRID_WIDTH, MAX_GRID_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::find_item;

    fn grunt(name: &str) -> Unit {
        Unit::new(name, find_item("Sword").unwrap(), None).unwrap()
    }

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[cfg(feature = "debug-validation")]
    #[test]
    fn test_validation_accepts_legal_mutations() {
        let mut bf = Battlefield::default();
        bf.place(grunt("a"), Team::One, p(0, 0)).unwrap();
        bf.place(grunt("b"), Team::One, p(0, 2)).unwrap();
        bf.place(grunt("c"), Team::Two, p(9, 0)).unwrap();
        bf.move_unit(p(0, 0), p(1, 1)).unwrap();
        assert!(bf.remove(p(0, 2)).is_some());
        assert!(bf.place(grunt("d"), Team::Two, p(9, 0)).is_err());

        assert_eq!(bf.unit_count(Team::One), 1);
        assert_eq!(bf.check_invariants(), Ok(()));
    }

    #[test]
    fn test_dimensions_are_capped() {
        let bf = Battlefield::new(50, 0);
        assert_eq!(bf.width(), 10);
        assert_eq!(bf.height(), 1);
    }

    #[test]
    fn test_is_valid_position() {
        let bf = Battlefield::default();
        assert!(bf.is_valid_position(p(0, 0)));
        assert!(bf.is_valid_position(p(9, 9)));
        assert!(!bf.is_valid_position(p(10, 0)));
        assert!(!bf.is_valid_position(p(0, -1)));
    }

    #[test]
    fn test_place_updates_cell_and_roster() {
        let mut bf = Battlefield::default();
        let id = bf.place(grunt("a"), Team::One, p(3, 4)).unwrap();
        assert_eq!(bf.occupant(p(3, 4)), Some(Occupant { unit: id, team: Team::One }));
        assert_eq!(bf.positions(Team::One).as_slice(), &[p(3, 4)]);
        assert_eq!(bf.unit_count(Team::One), 1);
        assert_eq!(bf.unit_count(Team::Two), 0);
        assert!(bf.check_invariants().is_ok());
    }

    #[test]
    fn test_sixth_placement_is_rejected() {
        let mut bf = Battlefield::default();
        for y in 0..5 {
            bf.place(grunt("a"), Team::Two, p(9, y)).unwrap();
        }
        let before = bf.clone();
        assert_eq!(
            bf.place(grunt("extra"), Team::Two, p(8, 8)),
            Err(GridError::TeamFull(Team::Two))
        );
        assert_eq!(bf, before);
    }

    #[test]
    fn test_place_out_of_bounds_or_occupied() {
        let mut bf = Battlefield::default();
        assert_eq!(
            bf.place(grunt("a"), Team::One, p(-1, 0)),
            Err(GridError::OutOfBounds(p(-1, 0)))
        );
        bf.place(grunt("a"), Team::One, p(0, 0)).unwrap();
        assert_eq!(
            bf.place(grunt("b"), Team::Two, p(0, 0)),
            Err(GridError::Occupied(p(0, 0)))
        );
        assert_eq!(bf.unit_count(Team::Two), 0);
    }

    #[test]
    fn test_remove_is_noop_on_empty_cell() {
        let mut bf = Battlefield::default();
        assert_eq!(bf.remove(p(1, 1)), None);
        assert_eq!(bf.remove(p(42, 1)), None);
    }

    #[test]
    fn test_remove_preserves_roster_order() {
        let mut bf = Battlefield::default();
        for y in [0, 2, 4, 6] {
            bf.place(grunt("a"), Team::One, p(0, y)).unwrap();
        }
        let removed = bf.remove(p(0, 2)).unwrap();
        assert_eq!(removed.team, Team::One);
        assert!(bf.occupant(p(0, 2)).is_none());
        assert_eq!(bf.positions(Team::One).as_slice(), &[p(0, 0), p(0, 4), p(0, 6)]);
        assert_eq!(bf.unit_count(Team::One), 3);
        assert!(bf.check_invariants().is_ok());
    }

    #[test]
    fn test_move_keeps_roster_index() {
        let mut bf = Battlefield::default();
        bf.place(grunt("a"), Team::One, p(0, 0)).unwrap();
        let id = bf.place(grunt("b"), Team::One, p(0, 2)).unwrap();
        bf.move_unit(p(0, 2), p(1, 3)).unwrap();
        assert_eq!(bf.positions(Team::One).get(1), Some(p(1, 3)));
        assert_eq!(bf.occupant(p(1, 3)).map(|o| o.unit), Some(id));
        assert!(bf.occupant(p(0, 2)).is_none());
        assert_eq!(bf.position_of(id), Some(p(1, 3)));
    }

    #[test]
    fn test_illegal_moves_change_nothing() {
        let mut bf = Battlefield::default();
        bf.place(grunt("a"), Team::One, p(0, 0)).unwrap();
        bf.place(grunt("b"), Team::Two, p(1, 0)).unwrap();
        let before = bf.clone();

        assert!(bf.move_unit(p(0, 0), p(2, 1)).is_err());
        assert!(bf.move_unit(p(0, 0), p(1, 0)).is_err());
        assert!(bf.move_unit(p(0, 0), p(-1, 0)).is_err());
        assert!(bf.move_unit(p(5, 5), p(5, 6)).is_err());
        assert_eq!(bf, before);
    }

    #[test]
    fn test_apply_damage_removes_on_defeat() {
        let mut bf = Battlefield::default();
        let id = bf.place(grunt("a"), Team::Two, p(4, 4)).unwrap();

        let report = bf.apply_damage(p(4, 4), 60).unwrap();
        assert_eq!(report.remaining, 40);
        assert!(!report.defeated);

        let report = bf.apply_damage(p(4, 4), 40).unwrap();
        assert!(report.defeated);
        assert_eq!(bf.unit_count(Team::Two), 0);
        assert!(bf.occupant(p(4, 4)).is_none());
        assert_eq!(bf.unit(id).map(|u| u.health), Some(0));
    }

    #[test]
    fn test_deploy_default_formation() {
        let mut bf = Battlefield::default();
        let army = Army::new(vec![grunt("a"), grunt("b"), grunt("c")]).unwrap();
        let ids = bf.deploy(Team::Two, army);
        assert_eq!(ids.len(), 3);
        assert_eq!(
            bf.positions(Team::Two).as_slice(),
            &[p(9, 0), p(9, 2), p(9, 4)]
        );
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut bf = Battlefield::default();
        bf.place(grunt("a"), Team::One, p(0, 0)).unwrap();
        bf.place(grunt("b"), Team::Two, p(9, 0)).unwrap();

        let bytes = bf.serialize().unwrap();
        let restored = Battlefield::deserialize(&bytes).unwrap();
        assert_eq!(restored, bf);
        assert_eq!(restored.state_hash(), bf.state_hash());
    }
}
