//! Bounded, order-preserving position list.
//!
//! Each team keeps the coordinates of its placed units in placement order.
//! The list is a denormalized index over the grid, so every invariant about
//! it lives here: capacity, uniqueness, and removal without reordering.

use serde::{Deserialize, Serialize};

use crate::grid::Position;

/// Maximum number of placed units per team.
pub const ROSTER_CAPACITY: usize = 5;

/// Ordered list of at most [`ROSTER_CAPACITY`] distinct positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roster {
    positions: Vec<Position>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: Vec::with_capacity(ROSTER_CAPACITY),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the roster holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Whether no more entries fit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.positions.len() >= ROSTER_CAPACITY
    }

    /// Append a position. Returns `false` (and changes nothing) when the
    /// roster is full or already holds the position.
    pub fn push(&mut self, position: Position) -> bool {
        if self.is_full() || self.contains(position) {
            return false;
        }
        self.positions.push(position);
        true
    }

    /// Remove a position, shifting later entries down. Returns the index
    /// the entry had, or `None` if it was absent.
    pub fn remove(&mut self, position: Position) -> Option<usize> {
        let index = self.index_of(position)?;
        self.positions.remove(index);
        Some(index)
    }

    /// Rewrite an entry in place, keeping its index. Returns the index, or
    /// `None` if `from` was absent or `to` is already listed.
    pub fn relocate(&mut self, from: Position, to: Position) -> Option<usize> {
        if self.contains(to) {
            return None;
        }
        let index = self.index_of(from)?;
        self.positions[index] = to;
        Some(index)
    }

    /// Whether the position is listed.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.positions.contains(&position)
    }

    /// Index of a position in placement order.
    #[must_use]
    pub fn index_of(&self, position: Position) -> Option<usize> {
        self.positions.iter().position(|&p| p == position)
    }

    /// Entry at an index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Position> {
        self.positions.get(index).copied()
    }

    /// Positions in placement order.
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions.iter().copied()
    }

    /// Positions as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Position] {
        &self.positions
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = Position;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Position>>;

    fn into_iter(self) -> Self::IntoIter {
        self.positions.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_push_until_full() {
        let mut roster = Roster::new();
        for y in 0..5 {
            assert!(roster.push(p(0, y)));
        }
        assert!(roster.is_full());
        assert!(!roster.push(p(1, 1)));
        assert_eq!(roster.len(), 5);
    }

    #[test]
    fn test_push_rejects_duplicates() {
        let mut roster = Roster::new();
        assert!(roster.push(p(2, 2)));
        assert!(!roster.push(p(2, 2)));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut roster = Roster::new();
        for y in [0, 2, 4, 6] {
            roster.push(p(0, y));
        }
        assert_eq!(roster.remove(p(0, 2)), Some(1));
        assert_eq!(roster.as_slice(), &[p(0, 0), p(0, 4), p(0, 6)]);
        assert_eq!(roster.remove(p(9, 9)), None);
    }

    #[test]
    fn test_relocate_keeps_index() {
        let mut roster = Roster::new();
        roster.push(p(0, 0));
        roster.push(p(0, 2));
        roster.push(p(0, 4));
        assert_eq!(roster.relocate(p(0, 2), p(1, 2)), Some(1));
        assert_eq!(roster.get(1), Some(p(1, 2)));
        assert_eq!(roster.relocate(p(0, 0), p(0, 4)), None);
        assert_eq!(roster.relocate(p(5, 5), p(6, 6)), None);
    }
}
