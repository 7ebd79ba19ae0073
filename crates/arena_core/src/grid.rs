//! Grid coordinates, teams and distance metrics.
//!
//! Two metrics are used on the battlefield:
//! - **Manhattan** for movement, attack range and AI target selection
//!   (diamond-shaped reach).
//! - **Chebyshev** only for area abilities (square blast).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest supported grid width.
pub const MAX_GRID_WIDTH: i32 = 10;

/// Largest supported grid height.
pub const MAX_GRID_HEIGHT: i32 = 10;

/// A cell coordinate. Signed so that offsets around a cell can be computed
/// before bounds checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Column, growing to the right.
    pub x: i32,
    /// Row, growing downwards.
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance `|x1-x2| + |y1-y2|`.
    #[must_use]
    pub const fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance `max(|x1-x2|, |y1-y2|)`.
    #[must_use]
    pub fn chebyshev(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Position shifted by the given offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Manhattan distance between two raw coordinates.
#[must_use]
pub const fn manhattan_distance(x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    (x1 - x2).abs() + (y1 - y2).abs()
}

/// One of the two opposing sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// Army 1, deployed on the left edge.
    One,
    /// Army 2, deployed on the right edge.
    Two,
}

impl Team {
    /// Both teams in turn order.
    pub const ALL: [Team; 2] = [Team::One, Team::Two];

    /// Zero-based index for per-team arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Team::One => 0,
            Team::Two => 1,
        }
    }

    /// Team tag as stored in save files and shown to players (1 or 2).
    #[must_use]
    pub const fn number(self) -> i32 {
        match self {
            Team::One => 1,
            Team::Two => 2,
        }
    }

    /// Parse a team tag (1 or 2).
    #[must_use]
    pub const fn from_number(number: i32) -> Option<Self> {
        match number {
            1 => Some(Team::One),
            2 => Some(Team::Two),
            _ => None,
        }
    }

    /// The opposing team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Army {}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_is_symmetric() {
        let a = Position::new(1, 7);
        let b = Position::new(4, 2);
        assert_eq!(a.manhattan(b), 8);
        assert_eq!(b.manhattan(a), 8);
        assert_eq!(manhattan_distance(1, 7, 4, 2), 8);
    }

    #[test]
    fn test_chebyshev_takes_larger_axis() {
        let a = Position::new(0, 0);
        assert_eq!(a.chebyshev(Position::new(2, 1)), 2);
        assert_eq!(a.chebyshev(Position::new(-1, -3)), 3);
    }

    #[test]
    fn test_team_round_trip() {
        for team in Team::ALL {
            assert_eq!(Team::from_number(team.number()), Some(team));
            assert_eq!(team.opponent().opponent(), team);
        }
        assert_eq!(Team::from_number(0), None);
        assert_eq!(Team::from_number(3), None);
    }
}
