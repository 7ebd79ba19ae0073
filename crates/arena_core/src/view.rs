//! Renderer seam.
//!
//! The core holds no display handles. After each change a front end builds
//! a [`BattleView`] and passes it by reference to its [`Renderer`].

use serde::{Deserialize, Serialize};

use crate::battlefield::{Battlefield, UnitId};
use crate::grid::{Position, Team};
use crate::items::item_summary;
use crate::rules;
use crate::turn::{Action, Phase, TurnMachine};
use crate::unit::STARTING_HEALTH;

/// A placed unit as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    /// Stable unit id.
    pub id: UnitId,
    /// Unit name.
    pub name: String,
    /// Owning team.
    pub team: Team,
    /// Current cell.
    pub position: Position,
    /// Current health.
    pub health: i32,
    /// Health at deployment.
    pub max_health: i32,
    /// Slot-1 summary, e.g. `Sword (A:10,D:5,R:1)`.
    pub primary: String,
    /// Slot-2 summary or `None`.
    pub secondary: String,
    /// Whether the unit has an area ability.
    pub special: bool,
}

/// Cells a renderer should tint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlights {
    /// Legal move destinations of the selected unit.
    pub moves: Vec<Position>,
    /// Cells within the selected unit's attack range.
    pub attack_range: Vec<Position>,
}

/// Snapshot of everything a renderer draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleView {
    /// Grid width.
    pub width: i32,
    /// Grid height.
    pub height: i32,
    /// Placed units, team 1 first, each in roster order.
    pub units: Vec<UnitView>,
    /// Current phase.
    pub phase: Phase,
    /// Team to act.
    pub active_team: Team,
    /// Cell of the selected unit.
    pub selected: Option<Position>,
    /// Menu entries the selected unit may pick.
    pub actions: Vec<Action>,
    /// Tinted cells for the current phase.
    pub highlights: Highlights,
    /// Control hint for the current phase.
    pub hint: String,
    /// Last message line.
    pub message: Option<String>,
}

impl BattleView {
    /// Snapshot a battle driven by a turn machine.
    #[must_use]
    pub fn capture(bf: &Battlefield, turn: &TurnMachine) -> Self {
        let selected = turn.selected();
        let highlights = match (turn.phase(), selected) {
            (Phase::MoveTarget, Some(pos)) => Highlights {
                moves: rules::reachable_cells(bf, pos),
                attack_range: Vec::new(),
            },
            (Phase::ActionSelect | Phase::AttackTarget, Some(pos)) => Highlights {
                moves: Vec::new(),
                attack_range: rules::attack_range_cells(bf, pos),
            },
            _ => Highlights::default(),
        };

        Self {
            width: bf.width(),
            height: bf.height(),
            units: unit_views(bf),
            phase: turn.phase(),
            active_team: turn.active_team(),
            selected,
            actions: turn.available_actions(bf),
            highlights,
            hint: turn.phase().hint().to_string(),
            message: turn.message().map(str::to_string),
        }
    }

    /// Snapshot a battle with no human input, as in AI-vs-AI play.
    #[must_use]
    pub fn observe(bf: &Battlefield, active_team: Team, message: Option<String>) -> Self {
        let over = Team::ALL.iter().any(|&team| bf.unit_count(team) == 0);
        let phase = if over { Phase::GameOver } else { Phase::Result };
        Self {
            width: bf.width(),
            height: bf.height(),
            units: unit_views(bf),
            phase,
            active_team,
            selected: None,
            actions: Vec::new(),
            highlights: Highlights::default(),
            hint: phase.hint().to_string(),
            message,
        }
    }

    /// Unit standing on a cell.
    #[must_use]
    pub fn unit_at(&self, pos: Position) -> Option<&UnitView> {
        self.units.iter().find(|u| u.position == pos)
    }

    /// Units of one team, in roster order.
    pub fn team_units(&self, team: Team) -> impl Iterator<Item = &UnitView> {
        self.units.iter().filter(move |u| u.team == team)
    }
}

fn unit_views(bf: &Battlefield) -> Vec<UnitView> {
    Team::ALL
        .iter()
        .flat_map(|&team| {
            bf.units_of(team).map(move |(position, id, unit)| UnitView {
                id,
                name: unit.name().to_string(),
                team,
                position,
                health: unit.health,
                max_health: STARTING_HEALTH,
                primary: item_summary(Some(unit.primary())),
                secondary: item_summary(unit.secondary()),
                special: unit.has_special_ability(),
            })
        })
        .collect()
}

/// Something that can draw a battle.
pub trait Renderer {
    /// Draw the current state.
    fn redraw(&mut self, view: &BattleView);
}

/// Renderer that draws nothing, for batch runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn redraw(&mut self, _view: &BattleView) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::find_item;
    use crate::turn::Intent;
    use crate::unit::Unit;

    fn setup() -> (Battlefield, TurnMachine) {
        let mut bf = Battlefield::default();
        let sword = find_item("Sword").unwrap();
        let shield = find_item("Shield").unwrap();
        bf.place(Unit::new("Ada", sword, Some(shield)).unwrap(), Team::One, Position::new(0, 0))
            .unwrap();
        bf.place(Unit::new("Bo", sword, None).unwrap(), Team::Two, Position::new(9, 0))
            .unwrap();
        (bf, TurnMachine::new(Team::One, false))
    }

    #[test]
    fn test_capture_lists_units() {
        let (bf, tm) = setup();
        let view = BattleView::capture(&bf, &tm);
        assert_eq!(view.units.len(), 2);
        let ada = view.unit_at(Position::new(0, 0)).unwrap();
        assert_eq!(ada.primary, "Sword (A:10,D:5,R:1)");
        assert_eq!(ada.secondary, "Shield (A:0,D:15,R:0)");
        assert_eq!(view.team_units(Team::Two).count(), 1);
        assert_eq!(view.hint, Phase::UnitSelect.hint());
    }

    #[test]
    fn test_highlights_follow_phase() {
        let (mut bf, mut tm) = setup();
        tm.handle(&mut bf, Intent::SelectUnit(Position::new(0, 0)))
            .unwrap();
        let view = BattleView::capture(&bf, &tm);
        assert!(view.highlights.moves.is_empty());
        assert_eq!(view.highlights.attack_range.len(), 3);

        tm.handle(&mut bf, Intent::Choose(Action::Move)).unwrap();
        let view = BattleView::capture(&bf, &tm);
        assert_eq!(view.highlights.moves.len(), 5);
        assert!(view.highlights.attack_range.is_empty());
    }

    #[test]
    fn test_observe_reports_game_over() {
        let (mut bf, _) = setup();
        bf.remove(Position::new(9, 0));
        let view = BattleView::observe(&bf, Team::One, None);
        assert_eq!(view.phase, Phase::GameOver);
    }
}
