//! Events emitted by resolved actions.
//!
//! The core never draws anything. Front ends, logs and metrics learn what
//! happened from these values, in the order the mutations were applied.

use serde::{Deserialize, Serialize};

use crate::battlefield::UnitId;
use crate::grid::{Position, Team};

/// Something that changed the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    /// A unit changed cells.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Its team.
        team: Team,
        /// Source cell.
        from: Position,
        /// Destination cell.
        to: Position,
    },
    /// A single-target attack landed.
    Attacked {
        /// Attacking unit.
        attacker: UnitId,
        /// Attacker's team.
        team: Team,
        /// Target cell.
        target: Position,
        /// Damage dealt.
        damage: i32,
        /// Target health after the hit.
        remaining: i32,
    },
    /// One enemy caught in an area blast.
    AreaHit {
        /// Unit that used the ability.
        caster: UnitId,
        /// Caster's team.
        team: Team,
        /// Cell of the enemy that was hit.
        target: Position,
        /// Damage dealt.
        damage: i32,
        /// Target health after the hit.
        remaining: i32,
    },
    /// A unit dropped to zero health and left the grid.
    UnitDefeated {
        /// Defeated unit.
        unit: UnitId,
        /// Its team.
        team: Team,
        /// Cell it was removed from.
        at: Position,
    },
    /// Control passed to the other team.
    TurnEnded {
        /// Team that just finished.
        team: Team,
        /// Team now acting.
        next: Team,
    },
    /// One side has no units left.
    BattleOver {
        /// Winning team, `None` for a draw.
        winner: Option<Team>,
    },
}

impl BattleEvent {
    /// Damage carried by the event, zero for non-damage events.
    #[must_use]
    pub const fn damage(&self) -> i32 {
        match self {
            BattleEvent::Attacked { damage, .. } | BattleEvent::AreaHit { damage, .. } => *damage,
            _ => 0,
        }
    }

    /// Player-facing one-liner, as shown in the message line.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            BattleEvent::UnitMoved { team, from, to, .. } => {
                format!("{team} unit moved from {from} to {to}")
            }
            BattleEvent::Attacked {
                team,
                target,
                damage,
                remaining,
                ..
            } => format!("{team} hit {target} for {damage} damage ({remaining} HP left)"),
            BattleEvent::AreaHit {
                team,
                target,
                damage,
                ..
            } => format!("{team} special ability hit {target} for {damage} damage"),
            BattleEvent::UnitDefeated { team, at, .. } => {
                format!("{team} unit at {at} was defeated")
            }
            BattleEvent::TurnEnded { next, .. } => format!("{next}'s turn"),
            BattleEvent::BattleOver { winner: Some(team) } => format!("{team} wins!"),
            BattleEvent::BattleOver { winner: None } => "The battle is a draw".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_only_on_hits() {
        let hit = BattleEvent::AreaHit {
            caster: UnitId::default(),
            team: Team::One,
            target: Position::new(1, 1),
            damage: 12,
            remaining: 88,
        };
        assert_eq!(hit.damage(), 12);
        assert_eq!(BattleEvent::BattleOver { winner: None }.damage(), 0);
    }

    #[test]
    fn test_describe_winner() {
        let over = BattleEvent::BattleOver {
            winner: Some(Team::Two),
        };
        assert_eq!(over.describe(), "Army 2 wins!");
    }

    #[test]
    fn test_json_tagging() {
        let event = BattleEvent::TurnEnded {
            team: Team::One,
            next: Team::Two,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"turn_ended""#));
    }
}
