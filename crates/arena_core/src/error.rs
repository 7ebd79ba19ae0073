//! Error types for the battle core.
//!
//! Nothing in a running battle panics: spatial rejections, illegal player
//! actions, setup problems and save-file failures are all values.

use thiserror::Error;

use crate::grid::{Position, Team};
use crate::turn::Phase;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the battle core.
#[derive(Debug, Error)]
pub enum GameError {
    /// A spatial operation on the grid was rejected.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// A player action broke a combat rule.
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    /// Army or unit setup failed.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Reading or writing a save file failed.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// An intent arrived that the current phase does not accept.
    #[error(transparent)]
    Turn(#[from] TurnError),
}

/// Rejected spatial operation. The grid is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    /// Coordinates fall outside the grid.
    #[error("position {0} is outside the battlefield")]
    OutOfBounds(Position),

    /// Destination cell already holds a unit.
    #[error("cell {0} is already occupied")]
    Occupied(Position),

    /// The team already has the maximum number of placed units.
    #[error("{0} already has {max} units on the field", max = crate::roster::ROSTER_CAPACITY)]
    TeamFull(Team),

    /// No unit stands on the cell.
    #[error("no unit at {0}")]
    EmptyCell(Position),
}

/// An illegal player action. Carries a message suitable for the player;
/// the turn is not consumed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// Move target is out of bounds, occupied or too far.
    #[error("Invalid move position! {from} -> {to}")]
    IllegalMove {
        /// Cell the unit stands on.
        from: Position,
        /// Requested destination.
        to: Position,
    },

    /// Attack target is empty, friendly, out of bounds or out of range.
    #[error("Invalid attack target! {from} -> {target}")]
    IllegalAttack {
        /// Cell the attacker stands on.
        from: Position,
        /// Requested target cell.
        target: Position,
    },

    /// The unit carries no item with an area radius.
    #[error("{0} has no special ability")]
    NoSpecialAbility(String),

    /// The unit already used this action during the current turn.
    #[error("action already used this turn")]
    ActionSpent,
}

/// Army setup failure. The numeric codes match the menu controller's
/// error codes so front ends can report them unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Army size outside `1..=5`.
    #[error("army must have between 1 and 5 units, got {0}")]
    UnitCount(usize),

    /// A unit was created without its mandatory primary item.
    #[error("unit '{0}' must select a primary item")]
    MissingPrimaryItem(String),

    /// An item name or index does not exist in the catalog.
    #[error("unknown item '{0}'")]
    UnknownItem(String),

    /// The chosen items need more than the two available slots.
    #[error("unit '{name}' needs {required} slots but only 2 are available")]
    Slots {
        /// Unit name.
        name: String,
        /// Total slot cost of the requested loadout.
        required: u8,
    },
}

impl SetupError {
    /// Distinguished numeric code propagated to the mode controller.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            SetupError::UnitCount(_) => -1,
            SetupError::MissingPrimaryItem(_) => -2,
            SetupError::UnknownItem(_) => -3,
            SetupError::Slots { .. } => -4,
        }
    }
}

/// Save file failure. In-memory state is never touched when this is returned.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Underlying file IO failed.
    #[error("save file io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file ended before a complete record was read.
    #[error("save file truncated: needed {needed} bytes at offset {offset}")]
    ShortRead {
        /// Byte offset where the read started.
        offset: usize,
        /// Number of bytes that were required.
        needed: usize,
    },

    /// A team count is outside `1..=5`.
    #[error("army size {0} out of range")]
    ArmySize(i32),

    /// The active team field is neither 1 nor 2.
    #[error("invalid active team {0}")]
    ActiveTeam(i32),

    /// A stored unit breaks the loadout rules.
    #[error("invalid unit in save file: {0}")]
    InvalidUnit(#[from] SetupError),

    /// A stored unit has no health left and cannot be placed.
    #[error("unit '{name}' has health {health} and is already defeated")]
    DefeatedUnit {
        /// Unit name.
        name: String,
        /// Stored health.
        health: i32,
    },

    /// A unit's primary item index does not resolve to a catalog entry.
    #[error("unit '{name}' has invalid primary item index {index}")]
    PrimaryItem {
        /// Unit name.
        name: String,
        /// Raw index read from the file.
        index: i32,
    },
}

/// Intent not accepted in the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The phase has no transition for this intent.
    #[error("'{intent}' is not allowed during {phase:?}")]
    NotAllowed {
        /// Phase the machine was in.
        phase: Phase,
        /// Short name of the rejected intent.
        intent: &'static str,
    },

    /// The selected cell does not hold a unit of the active team.
    #[error("no unit of {team} at {at}")]
    NotYourUnit {
        /// Team whose turn it is.
        team: Team,
        /// Cell that was selected.
        at: Position,
    },

    /// The battle is over.
    #[error("the battle is over")]
    GameOver,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_codes_are_distinct() {
        let codes = [
            SetupError::UnitCount(0).code(),
            SetupError::MissingPrimaryItem("a".into()).code(),
            SetupError::UnknownItem("b".into()).code(),
            SetupError::Slots {
                name: "c".into(),
                required: 3,
            }
            .code(),
        ];
        assert_eq!(codes, [-1, -2, -3, -4]);
    }

    #[test]
    fn test_grid_error_converts() {
        let err: GameError = GridError::OutOfBounds(Position::new(-1, 0)).into();
        assert!(matches!(err, GameError::Grid(GridError::OutOfBounds(_))));
        assert_eq!(err.to_string(), "position (-1, 0) is outside the battlefield");
    }
}
