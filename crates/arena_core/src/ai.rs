//! Computer-controlled team.
//!
//! Each unit, in roster order, attacks the nearest enemy it can legally
//! reach. A unit with nothing in range takes one greedy step toward the
//! nearest enemy, x axis first. There is no pathfinding, so a blocked unit
//! simply waits.
//!
//! Ties always go to the enemy listed first in the enemy roster. Changing
//! that order changes battle outcomes, so both scans keep a strict `<`.

use crate::battlefield::Battlefield;
use crate::events::BattleEvent;
use crate::grid::{Position, Team};
use crate::rules;

/// What one AI unit does this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiDecision {
    /// Attack the enemy on this cell.
    Attack(Position),
    /// Step to this adjacent cell.
    Step(Position),
    /// Do nothing.
    Hold,
}

/// Drives every unit of one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiController {
    team: Team,
}

impl AiController {
    /// Controller for `team`.
    #[must_use]
    pub const fn new(team: Team) -> Self {
        Self { team }
    }

    /// Team this controller plays.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Decide for the unit standing on `from`.
    #[must_use]
    pub fn decide(&self, bf: &Battlefield, from: Position) -> AiDecision {
        if let Some(target) = nearest_attack_target(bf, self.team, from) {
            return AiDecision::Attack(target);
        }
        nearest_enemy(bf, self.team, from)
            .and_then(|enemy| greedy_step(bf, from, enemy))
            .map_or(AiDecision::Hold, AiDecision::Step)
    }

    /// Let every unit of the team act once, in roster order.
    ///
    /// Each decision is taken against the battlefield as left by the
    /// previous unit.
    pub fn take_turn(&self, bf: &mut Battlefield) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        let mut index = 0;
        while let Some(from) = bf.positions(self.team).get(index) {
            index += 1;
            let decision = self.decide(bf, from);
            tracing::debug!(team = self.team.number(), unit = %from, ?decision, "AI decision");

            match decision {
                AiDecision::Attack(target) => match rules::resolve_attack(bf, from, target) {
                    Ok(hit) => events.extend(hit),
                    Err(err) => tracing::warn!(error = %err, "AI attack rejected"),
                },
                AiDecision::Step(to) => {
                    let Some(occupant) = bf.occupant(from) else {
                        continue;
                    };
                    match bf.move_unit(from, to) {
                        Ok(()) => events.push(BattleEvent::UnitMoved {
                            unit: occupant.unit,
                            team: occupant.team,
                            from,
                            to,
                        }),
                        Err(err) => tracing::warn!(error = %err, "AI step rejected"),
                    }
                }
                AiDecision::Hold => {}
            }
        }
        events
    }
}

/// Nearest enemy the unit on `from` may legally attack.
#[must_use]
pub fn nearest_attack_target(bf: &Battlefield, team: Team, from: Position) -> Option<Position> {
    nearest(
        bf.positions(team.opponent())
            .iter()
            .filter(|&pos| rules::is_valid_attack_target(bf, from, pos)),
        from,
    )
}

/// Nearest enemy by Manhattan distance, ignoring range and legality.
#[must_use]
pub fn nearest_enemy(bf: &Battlefield, team: Team, from: Position) -> Option<Position> {
    nearest(bf.positions(team.opponent()).iter(), from)
}

fn nearest(candidates: impl Iterator<Item = Position>, from: Position) -> Option<Position> {
    let mut best: Option<(i32, Position)> = None;
    for pos in candidates {
        let dist = from.manhattan(pos);
        if best.map_or(true, |(min, _)| dist < min) {
            best = Some((dist, pos));
        }
    }
    best.map(|(_, pos)| pos)
}

/// One square toward `target`: along x if that cell is free, else along y.
#[must_use]
pub fn greedy_step(bf: &Battlefield, from: Position, target: Position) -> Option<Position> {
    if from == target {
        return None;
    }
    let dx = (target.x - from.x).signum();
    let dy = (target.y - from.y).signum();

    [(dx, 0), (0, dy)]
        .into_iter()
        .filter(|&(sx, sy)| sx != 0 || sy != 0)
        .map(|(sx, sy)| from.offset(sx, sy))
        .find(|&to| rules::is_valid_move(bf, from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::find_item;
    use crate::unit::Unit;

    fn unit(primary: &str) -> Unit {
        Unit::new(primary, find_item(primary).unwrap(), None).unwrap()
    }

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_attacks_nearest_in_range() {
        let mut bf = Battlefield::default();
        bf.place(unit("Crossbow"), Team::One, p(0, 0)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(3, 0)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(0, 2)).unwrap();

        let ai = AiController::new(Team::One);
        assert_eq!(ai.decide(&bf, p(0, 0)), AiDecision::Attack(p(0, 2)));
    }

    #[test]
    fn test_tie_goes_to_first_in_roster() {
        let mut bf = Battlefield::default();
        bf.place(unit("Bow"), Team::One, p(4, 4)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(6, 4)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(4, 2)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(2, 4)).unwrap();

        let ai = AiController::new(Team::One);
        assert_eq!(ai.decide(&bf, p(4, 4)), AiDecision::Attack(p(6, 4)));
    }

    #[test]
    fn test_steps_x_first() {
        let mut bf = Battlefield::default();
        bf.place(unit("Sword"), Team::One, p(0, 0)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(5, 5)).unwrap();

        let ai = AiController::new(Team::One);
        assert_eq!(ai.decide(&bf, p(0, 0)), AiDecision::Step(p(1, 0)));
    }

    #[test]
    fn test_falls_back_to_y_when_blocked() {
        let mut bf = Battlefield::default();
        bf.place(unit("Sword"), Team::One, p(0, 0)).unwrap();
        bf.place(unit("Shield"), Team::One, p(1, 0)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(5, 5)).unwrap();

        let ai = AiController::new(Team::One);
        assert_eq!(ai.decide(&bf, p(0, 0)), AiDecision::Step(p(0, 1)));
    }

    #[test]
    fn test_holds_when_boxed_in() {
        let mut bf = Battlefield::default();
        bf.place(unit("Shield"), Team::One, p(0, 0)).unwrap();
        bf.place(unit("Shield"), Team::One, p(1, 0)).unwrap();
        bf.place(unit("Shield"), Team::One, p(0, 1)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(5, 5)).unwrap();

        let ai = AiController::new(Team::One);
        assert_eq!(ai.decide(&bf, p(0, 0)), AiDecision::Hold);
    }

    #[test]
    fn test_nearest_enemy_ignores_range() {
        let mut bf = Battlefield::default();
        bf.place(unit("Shield"), Team::One, p(0, 0)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(9, 9)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(1, 0)).unwrap();
        assert_eq!(nearest_attack_target(&bf, Team::One, p(0, 0)), None);
        assert_eq!(nearest_enemy(&bf, Team::One, p(0, 0)), Some(p(1, 0)));
    }

    #[test]
    fn test_take_turn_moves_whole_team() {
        let mut bf = Battlefield::default();
        bf.place(unit("Sword"), Team::Two, p(9, 0)).unwrap();
        bf.place(unit("Sword"), Team::Two, p(9, 2)).unwrap();
        bf.place(unit("Sword"), Team::One, p(0, 0)).unwrap();

        let events = AiController::new(Team::Two).take_turn(&mut bf);
        assert_eq!(events.len(), 2);
        assert_eq!(bf.positions(Team::Two).as_slice(), &[p(8, 0), p(8, 2)]);
    }

    #[test]
    fn test_no_enemies_no_action() {
        let mut bf = Battlefield::default();
        bf.place(unit("Sword"), Team::One, p(0, 0)).unwrap();
        let events = AiController::new(Team::One).take_turn(&mut bf);
        assert!(events.is_empty());
    }
}
