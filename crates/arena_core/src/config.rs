//! Battle configuration.

use serde::{Deserialize, Serialize};

use crate::grid::{Team, MAX_GRID_HEIGHT, MAX_GRID_WIDTH};

/// Settings fixed for the duration of one battle.
///
/// Every field has a default, so scenario files only need to mention the
/// values they change:
///
/// ```ron
/// (width: 8, height: 8, max_rounds: 50)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Grid width, clamped to `1..=10`.
    pub width: i32,
    /// Grid height, clamped to `1..=10`.
    pub height: i32,
    /// Round limit for AI battles. Negative means unlimited.
    pub max_rounds: i32,
    /// Team that acts first in every round.
    pub first_team: Team,
    /// Let a unit attack (or use its special) after moving in the same turn.
    pub move_then_attack: bool,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            width: MAX_GRID_WIDTH,
            height: MAX_GRID_HEIGHT,
            max_rounds: -1,
            first_team: Team::One,
            move_then_attack: false,
        }
    }
}

impl BattleConfig {
    /// Parse a configuration from RON and clamp it.
    ///
    /// # Errors
    ///
    /// Returns the RON error if the text does not parse.
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str::<Self>(text).map(Self::clamped)
    }

    /// Copy with the grid dimensions forced into the supported range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.clamp(1, MAX_GRID_WIDTH),
            height: self.height.clamp(1, MAX_GRID_HEIGHT),
            ..self
        }
    }

    /// Round limit, or `None` when unlimited.
    #[must_use]
    pub fn round_limit(&self) -> Option<u32> {
        u32::try_from(self.max_rounds).ok()
    }
}
