//! Turn and action state machine.
//!
//! A human turn walks through a fixed sequence of phases:
//!
//! ```text
//! UnitSelect ──select──▶ ActionSelect ──move───▶ MoveTarget ───┐
//!      ▲                   │    │    └─attack──▶ AttackTarget ─┤ resolve
//!      │                   │    └─special (resolves at once) ──┤
//!      │                   └─end turn ──▶ UnitSelect           ▼
//!      └────────────── acknowledge ─────────────────────── Result
//!                                          (or GameOver when a side is wiped out)
//! ```
//!
//! The phase graph itself is the pure function [`transition`]. The
//! [`TurnMachine`] feeds it [`Step`]s derived from player [`Intent`]s after
//! checking them against the battlefield. Rejected targets keep the phase as
//! it is, so a bad click never costs the turn.

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::error::{GameError, GridError, Result, RuleViolation, TurnError};
use crate::events::BattleEvent;
use crate::grid::{Position, Team};
use crate::rules;

/// What kind of input the machine expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the active team to pick a unit.
    UnitSelect,
    /// A unit is selected, waiting for an action.
    ActionSelect,
    /// Waiting for a destination cell.
    MoveTarget,
    /// Waiting for an enemy to attack.
    AttackTarget,
    /// An action was resolved and the turn has passed. Purely a pause for
    /// renderers.
    Result,
    /// One team has no units left.
    GameOver,
}

impl Phase {
    /// Every phase, for exhaustive checks.
    pub const ALL: [Phase; 6] = [
        Phase::UnitSelect,
        Phase::ActionSelect,
        Phase::MoveTarget,
        Phase::AttackTarget,
        Phase::Result,
        Phase::GameOver,
    ];

    /// Control hint shown while in this phase.
    #[must_use]
    pub const fn hint(self) -> &'static str {
        match self {
            Phase::UnitSelect => {
                "Select a unit to command | Arrow keys: Move cursor | Enter: Select unit | Esc: Cancel"
            }
            Phase::ActionSelect => {
                "Choose action | Up/Down: Select | Enter: Confirm | Esc: Cancel | Range shown in yellow"
            }
            Phase::MoveTarget => {
                "Choose where to move (2 squares max) | Arrow keys: Move | Enter: Confirm | Esc: Cancel"
            }
            Phase::AttackTarget => {
                "Choose target within range | Arrow keys: Move | Enter: Attack | Esc: Cancel"
            }
            Phase::Result => {
                "Combat resolved! Press any key to continue... | Current HP shown in status panel"
            }
            Phase::GameOver => "Game Over! Press any key to return to main menu | S: Save replay",
        }
    }
}

/// Entries of the action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Pick a destination up to two squares away.
    Move,
    /// Pick an enemy within range.
    Attack,
    /// Area ability centered on the unit. Needs an item with a radius.
    Special,
    /// Pass the turn without acting.
    EndTurn,
}

impl Action {
    /// Menu order.
    pub const ALL: [Action; 4] = [Action::Move, Action::Attack, Action::Special, Action::EndTurn];

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Action::Move => "Move",
            Action::Attack => "Attack",
            Action::Special => "Special",
            Action::EndTurn => "End Turn",
        }
    }
}

/// Abstract player input, already decoupled from keys or mouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Select the unit standing on a cell.
    SelectUnit(Position),
    /// Pick an entry of the action menu.
    Choose(Action),
    /// Confirm a destination or target cell.
    Target(Position),
    /// Back out of the current selection.
    Cancel,
    /// Dismiss the result pause.
    Acknowledge,
}

impl Intent {
    /// Short name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Intent::SelectUnit(_) => "select unit",
            Intent::Choose(_) => "choose action",
            Intent::Target(_) => "target",
            Intent::Cancel => "cancel",
            Intent::Acknowledge => "acknowledge",
        }
    }
}

/// A validated event driving the phase graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// A unit of the active team was selected.
    UnitSelected,
    /// Move was picked from the menu.
    MoveChosen,
    /// Attack was picked from the menu.
    AttackChosen,
    /// An action resolved and the turn passed.
    Resolved,
    /// A move resolved and the unit may still attack.
    MovedKeepUnit,
    /// A resolution left a team with no units.
    SideEliminated,
    /// End Turn was picked.
    TurnEnded,
    /// Selection dropped without side effects.
    Cancelled,
    /// Target selection abandoned, back to the menu of a unit that already
    /// moved.
    BackToMenu,
    /// The result pause was dismissed.
    Acknowledged,
}

impl Step {
    /// Every step, for exhaustive checks.
    pub const ALL: [Step; 10] = [
        Step::UnitSelected,
        Step::MoveChosen,
        Step::AttackChosen,
        Step::Resolved,
        Step::MovedKeepUnit,
        Step::SideEliminated,
        Step::TurnEnded,
        Step::Cancelled,
        Step::BackToMenu,
        Step::Acknowledged,
    ];
}

/// The phase graph. Returns `None` where the step is not accepted.
#[must_use]
pub const fn transition(phase: Phase, step: Step) -> Option<Phase> {
    use Phase as P;
    use Step as S;

    match (phase, step) {
        (P::UnitSelect, S::UnitSelected) => Some(P::ActionSelect),
        (P::UnitSelect, S::Resolved) => Some(P::Result),
        (P::UnitSelect, S::SideEliminated) => Some(P::GameOver),

        (P::ActionSelect, S::MoveChosen) => Some(P::MoveTarget),
        (P::ActionSelect, S::AttackChosen) => Some(P::AttackTarget),
        (P::ActionSelect, S::Resolved) => Some(P::Result),
        (P::ActionSelect | P::AttackTarget, S::SideEliminated) => Some(P::GameOver),
        (P::ActionSelect, S::TurnEnded | S::Cancelled) => Some(P::UnitSelect),

        (P::MoveTarget, S::Resolved) | (P::AttackTarget, S::Resolved) => Some(P::Result),
        (P::MoveTarget, S::MovedKeepUnit) => Some(P::ActionSelect),
        (P::MoveTarget | P::AttackTarget, S::Cancelled) => Some(P::UnitSelect),
        (P::ActionSelect | P::MoveTarget | P::AttackTarget, S::BackToMenu) => Some(P::ActionSelect),

        (P::Result, S::Acknowledged) => Some(P::UnitSelect),

        _ => None,
    }
}

/// Turn and selection state of a battle with human players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMachine {
    phase: Phase,
    active: Team,
    selected: Option<Position>,
    has_moved: bool,
    has_attacked: bool,
    move_then_attack: bool,
    message: Option<String>,
}

impl TurnMachine {
    /// Start in [`Phase::UnitSelect`] with `first` to act.
    #[must_use]
    pub fn new(first: Team, move_then_attack: bool) -> Self {
        Self {
            phase: Phase::UnitSelect,
            active: first,
            selected: None,
            has_moved: false,
            has_attacked: false,
            move_then_attack,
            message: Some(format!("{first}'s turn")),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Team whose turn it is.
    #[must_use]
    pub const fn active_team(&self) -> Team {
        self.active
    }

    /// Cell of the selected unit.
    #[must_use]
    pub const fn selected(&self) -> Option<Position> {
        self.selected
    }

    /// Whether the selected unit already moved this turn.
    #[must_use]
    pub const fn has_moved(&self) -> bool {
        self.has_moved
    }

    /// Whether the selected unit already attacked this turn.
    #[must_use]
    pub const fn has_attacked(&self) -> bool {
        self.has_attacked
    }

    /// Last player-facing message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether the battle has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver)
    }

    /// Actions the selected unit may pick, in menu order. Empty when no
    /// unit is selected.
    #[must_use]
    pub fn available_actions(&self, bf: &Battlefield) -> Vec<Action> {
        let Some(unit) = self.selected.and_then(|pos| bf.unit_at(pos)) else {
            return Vec::new();
        };
        Action::ALL
            .into_iter()
            .filter(|action| match action {
                Action::Move => !self.has_moved,
                Action::Attack => !self.has_attacked,
                Action::Special => !self.has_attacked && unit.has_special_ability(),
                Action::EndTurn => true,
            })
            .collect()
    }

    /// Hand the turn to `team` with a clean selection, as after loading a
    /// save.
    pub fn reset_to(&mut self, team: Team) {
        self.phase = Phase::UnitSelect;
        self.active = team;
        self.clear_selection();
        self.message = Some(format!("{team}'s turn"));
    }

    /// Close a turn that was played without intents, by an AI controller.
    /// The machine must be waiting in [`Phase::UnitSelect`]; `events` are the
    /// events of that turn and get the turn or battle end appended.
    ///
    /// # Errors
    ///
    /// [`TurnError`] if the machine is not waiting for a unit selection.
    pub fn finish_external_turn(
        &mut self,
        bf: &Battlefield,
        events: &mut Vec<BattleEvent>,
    ) -> Result<()> {
        if self.is_over() {
            return Err(TurnError::GameOver.into());
        }
        self.finish_resolution(bf, events, "external turn")
    }

    /// Feed one intent.
    ///
    /// On success, returns the events produced by whatever was resolved
    /// (possibly none). On failure, nothing changes except the message line.
    ///
    /// # Errors
    ///
    /// - [`TurnError`] when the intent does not fit the current phase
    /// - [`RuleViolation`] for illegal moves, attacks or actions
    /// - [`crate::error::GridError`] for moves from an empty cell
    pub fn handle(&mut self, bf: &mut Battlefield, intent: Intent) -> Result<Vec<BattleEvent>> {
        let outcome = self.dispatch(bf, intent);
        if let Err(err) = &outcome {
            tracing::debug!(phase = ?self.phase, intent = intent.name(), error = %err, "Intent rejected");
            self.message = Some(err.to_string());
        }
        outcome
    }

    fn dispatch(&mut self, bf: &mut Battlefield, intent: Intent) -> Result<Vec<BattleEvent>> {
        if self.is_over() {
            return Err(TurnError::GameOver.into());
        }

        match (self.phase, intent) {
            (Phase::UnitSelect, Intent::SelectUnit(pos)) => {
                if bf.team_at(pos) != Some(self.active) {
                    return Err(TurnError::NotYourUnit {
                        team: self.active,
                        at: pos,
                    }
                    .into());
                }
                self.selected = Some(pos);
                self.message = bf.unit_at(pos).map(|u| format!("{} selected", u.name()));
                self.advance(Step::UnitSelected, intent.name())?;
                Ok(Vec::new())
            }

            (Phase::ActionSelect, Intent::Choose(action)) => self.choose(bf, action, intent),

            (Phase::MoveTarget, Intent::Target(to)) => {
                let from = self.selected_or_err(intent)?;
                let occupant = bf
                    .occupant(from)
                    .ok_or(GridError::EmptyCell(from))?;
                bf.move_unit(from, to)?;
                let mut events = vec![BattleEvent::UnitMoved {
                    unit: occupant.unit,
                    team: occupant.team,
                    from,
                    to,
                }];

                if self.move_then_attack && !self.has_attacked {
                    self.has_moved = true;
                    self.selected = Some(to);
                    self.message = Some("Moved. Choose another action or end the turn".into());
                    self.advance(Step::MovedKeepUnit, intent.name())?;
                } else {
                    self.finish_resolution(bf, &mut events, intent.name())?;
                }
                Ok(events)
            }

            (Phase::AttackTarget, Intent::Target(target)) => {
                let from = self.selected_or_err(intent)?;
                let mut events = rules::resolve_attack(bf, from, target)?;
                self.has_attacked = true;
                self.finish_resolution(bf, &mut events, intent.name())?;
                Ok(events)
            }

            (Phase::ActionSelect | Phase::MoveTarget | Phase::AttackTarget, Intent::Cancel) => {
                if self.has_moved {
                    // The unit is committed once it moved: back to its menu.
                    self.advance(Step::BackToMenu, intent.name())?;
                    self.message = Some("Unit already moved. Attack or end the turn".into());
                } else {
                    self.advance(Step::Cancelled, intent.name())?;
                    self.clear_selection();
                }
                Ok(Vec::new())
            }

            (Phase::Result, Intent::Acknowledge) => {
                self.advance(Step::Acknowledged, intent.name())?;
                Ok(Vec::new())
            }

            (phase, intent) => Err(TurnError::NotAllowed {
                phase,
                intent: intent.name(),
            }
            .into()),
        }
    }

    fn choose(&mut self, bf: &mut Battlefield, action: Action, intent: Intent) -> Result<Vec<BattleEvent>> {
        let at = self.selected_or_err(intent)?;
        if !self.available_actions(bf).contains(&action) {
            return Err(match (action, bf.unit_at(at)) {
                (Action::Special, Some(unit)) if !unit.has_special_ability() => {
                    RuleViolation::NoSpecialAbility(unit.name().to_string()).into()
                }
                _ => RuleViolation::ActionSpent.into(),
            });
        }

        match action {
            Action::Move => {
                self.message = Some("Choose where to move".into());
                self.advance(Step::MoveChosen, intent.name())?;
                Ok(Vec::new())
            }
            Action::Attack => {
                self.message = Some("Choose a target".into());
                self.advance(Step::AttackChosen, intent.name())?;
                Ok(Vec::new())
            }
            Action::Special => {
                let mut events = rules::resolve_area_ability(bf, at)?;
                self.has_attacked = true;
                self.finish_resolution(bf, &mut events, intent.name())?;
                Ok(events)
            }
            Action::EndTurn => {
                self.advance(Step::TurnEnded, intent.name())?;
                Ok(vec![self.end_turn()])
            }
        }
    }

    /// Close the turn after a resolved action, or the battle if a side was
    /// wiped out.
    fn finish_resolution(
        &mut self,
        bf: &Battlefield,
        events: &mut Vec<BattleEvent>,
        intent: &'static str,
    ) -> Result<()> {
        let alive = Team::ALL.map(|team| bf.unit_count(team) > 0);
        if alive.contains(&false) {
            self.advance(Step::SideEliminated, intent)?;
            self.clear_selection();
            let winner = match alive {
                [true, false] => Some(Team::One),
                [false, true] => Some(Team::Two),
                _ => None,
            };
            let over = BattleEvent::BattleOver { winner };
            self.message = Some(over.describe());
            tracing::info!(winner = ?winner.map(Team::number), "Battle over");
            events.push(over);
            return Ok(());
        }

        self.advance(Step::Resolved, intent)?;
        events.push(self.end_turn());
        Ok(())
    }

    fn end_turn(&mut self) -> BattleEvent {
        let team = self.active;
        self.active = team.opponent();
        self.clear_selection();
        self.message = Some(format!("Turn ended. {}'s turn", self.active));
        tracing::debug!(team = team.number(), next = self.active.number(), "Turn ended");
        BattleEvent::TurnEnded {
            team,
            next: self.active,
        }
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.has_moved = false;
        self.has_attacked = false;
    }

    fn selected_or_err(&self, intent: Intent) -> Result<Position> {
        self.selected.ok_or_else(|| {
            GameError::from(TurnError::NotAllowed {
                phase: self.phase,
                intent: intent.name(),
            })
        })
    }

    fn advance(&mut self, step: Step, intent: &'static str) -> Result<()> {
        let next = transition(self.phase, step).ok_or(TurnError::NotAllowed {
            phase: self.phase,
            intent,
        })?;
        self.phase = next;
        Ok(())
    }
}
