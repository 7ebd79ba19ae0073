//! Battle loop and sessions.
//!
//! Two ways to drive a battle:
//!
//! - [`Battle`] runs whole rounds between two [`Controller`]s (AI vs AI)
//!   until a side is wiped out, the round limit runs out, or nothing
//!   happens for a full round.
//! - [`Session`] pairs a [`TurnMachine`] with the battlefield for human
//!   play, letting an AI take the turns of any team the mode assigns to it.
//!
//! # Example
//!
//! ```
//! use arena_core::prelude::*;
//!
//! let army = |primary: &str| Army::from_specs(&[UnitSpec::new("Solo", primary)]).unwrap();
//! let mut battle = Battle::new(BattleConfig::default(), army("Greatsword"), army("Bow"));
//!
//! assert_eq!(battle.run(), BattleOutcome::Winner(Team::One));
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ai::AiController;
use crate::army::Army;
use crate::battlefield::Battlefield;
use crate::config::BattleConfig;
use crate::error::{Result, SaveError, TurnError};
use crate::events::BattleEvent;
use crate::grid::Team;
use crate::save::{self, SaveData};
use crate::turn::{Intent, Phase, TurnMachine};
use crate::unit::Unit;
use crate::view::BattleView;

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    /// The other team has no units left.
    Winner(Team),
    /// Both teams still stand (round limit or stalemate) or both fell.
    Draw,
}

impl BattleOutcome {
    /// Outcome from the live unit counts.
    #[must_use]
    pub fn from_battlefield(bf: &Battlefield) -> Self {
        match (bf.unit_count(Team::One) > 0, bf.unit_count(Team::Two) > 0) {
            (true, false) => BattleOutcome::Winner(Team::One),
            (false, true) => BattleOutcome::Winner(Team::Two),
            _ => BattleOutcome::Draw,
        }
    }

    /// Winning team, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Team> {
        match self {
            BattleOutcome::Winner(team) => Some(team),
            BattleOutcome::Draw => None,
        }
    }
}

/// Something that plays a whole turn for one team without player input.
pub trait Controller {
    /// Team this controller plays.
    fn team(&self) -> Team;

    /// Act with every unit of the team once.
    fn play_turn(&mut self, bf: &mut Battlefield) -> Vec<BattleEvent>;
}

impl Controller for AiController {
    fn team(&self) -> Team {
        AiController::team(self)
    }

    fn play_turn(&mut self, bf: &mut Battlefield) -> Vec<BattleEvent> {
        self.take_turn(bf)
    }
}

/// A battle fought in full rounds between two controllers.
#[derive(Debug, Clone)]
pub struct Battle<C = AiController> {
    battlefield: Battlefield,
    config: BattleConfig,
    controllers: [C; 2],
    rounds_played: u32,
    stalled: bool,
}

impl Battle<AiController> {
    /// Deploy both armies in the default formation, AI on both sides.
    #[must_use]
    pub fn new(config: BattleConfig, army_one: Army, army_two: Army) -> Self {
        let config = config.clamped();
        let mut battlefield = Battlefield::new(config.width, config.height);
        battlefield.deploy(Team::One, army_one);
        battlefield.deploy(Team::Two, army_two);
        Self::with_controllers(
            battlefield,
            config,
            [AiController::new(Team::One), AiController::new(Team::Two)],
        )
    }
}

impl<C: Controller> Battle<C> {
    /// Battle on a prepared battlefield. `controllers` are indexed by
    /// [`Team::index`].
    #[must_use]
    pub fn with_controllers(battlefield: Battlefield, config: BattleConfig, controllers: [C; 2]) -> Self {
        tracing::info!(
            team_one = battlefield.unit_count(Team::One),
            team_two = battlefield.unit_count(Team::Two),
            max_rounds = config.max_rounds,
            "Battle started"
        );
        Self {
            battlefield,
            config,
            controllers,
            rounds_played: 0,
            stalled: false,
        }
    }

    /// The battlefield.
    #[must_use]
    pub fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    /// Settings in effect.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Completed rounds.
    #[must_use]
    pub const fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    /// Whether a full round passed without anything happening.
    #[must_use]
    pub const fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Whether no further round will be played.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        let wiped_out = Team::ALL.iter().any(|&team| self.battlefield.unit_count(team) == 0);
        let out_of_rounds = self
            .config
            .round_limit()
            .is_some_and(|limit| self.rounds_played >= limit);
        wiped_out || out_of_rounds || self.stalled
    }

    /// Outcome, once the battle is finished.
    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.is_finished()
            .then(|| BattleOutcome::from_battlefield(&self.battlefield))
    }

    /// Play one round: the first team acts, then the other, each only while
    /// both sides still have units. Returns the round's events, ending with
    /// [`BattleEvent::BattleOver`] if the round finished the battle.
    pub fn play_round(&mut self) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        if self.is_finished() {
            return events;
        }

        let first = self.config.first_team;
        let mut acted = false;
        for team in [first, first.opponent()] {
            if Team::ALL.iter().any(|&t| self.battlefield.unit_count(t) == 0) {
                break;
            }
            let turn = self.controllers[team.index()].play_turn(&mut self.battlefield);
            acted |= !turn.is_empty();
            events.extend(turn);
            events.push(BattleEvent::TurnEnded {
                team,
                next: team.opponent(),
            });
        }

        self.rounds_played += 1;
        self.stalled = !acted;
        tracing::debug!(round = self.rounds_played, events = events.len(), "Round played");

        if let Some(outcome) = self.outcome() {
            tracing::info!(
                rounds = self.rounds_played,
                winner = ?outcome.winner().map(Team::number),
                stalled = self.stalled,
                "Battle finished"
            );
            events.push(BattleEvent::BattleOver {
                winner: outcome.winner(),
            });
        }
        events
    }

    /// Play rounds until the battle is finished.
    pub fn run(&mut self) -> BattleOutcome {
        self.run_with(|_, _| {})
    }

    /// Play rounds until the battle is finished, calling `observe` after
    /// every round with the battlefield and that round's events.
    pub fn run_with(&mut self, mut observe: impl FnMut(&Battlefield, &[BattleEvent])) -> BattleOutcome {
        while !self.is_finished() {
            let events = self.play_round();
            observe(&self.battlefield, &events);
        }
        BattleOutcome::from_battlefield(&self.battlefield)
    }

    /// Hash of the battlefield, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.battlefield.state_hash()
    }
}

/// Who controls each team in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleMode {
    /// Both teams take intents.
    #[default]
    HumanVsHuman,
    /// Team 1 takes intents, team 2 is the AI.
    HumanVsAi,
    /// Both teams are the AI.
    AiVsAi,
}

impl BattleMode {
    /// Whether the AI plays `team` in this mode.
    #[must_use]
    pub const fn is_ai(self, team: Team) -> bool {
        match self {
            BattleMode::HumanVsHuman => false,
            BattleMode::HumanVsAi => matches!(team, Team::Two),
            BattleMode::AiVsAi => true,
        }
    }
}

/// A battle driven turn by turn through intents.
#[derive(Debug, Clone)]
pub struct Session {
    battlefield: Battlefield,
    turn: TurnMachine,
    mode: BattleMode,
    config: BattleConfig,
    turns_played: u32,
}

impl Session {
    /// Deploy both armies and hand the first turn to `config.first_team`.
    #[must_use]
    pub fn new(config: BattleConfig, mode: BattleMode, army_one: Army, army_two: Army) -> Self {
        let config = config.clamped();
        let mut battlefield = Battlefield::new(config.width, config.height);
        battlefield.deploy(Team::One, army_one);
        battlefield.deploy(Team::Two, army_two);
        let turn = TurnMachine::new(config.first_team, config.move_then_attack);
        tracing::info!(?mode, first = config.first_team.number(), "Session started");
        Self {
            battlefield,
            turn,
            mode,
            config,
            turns_played: 0,
        }
    }

    /// Rebuild a session from save data: each team is redeployed in the
    /// default formation and the saved team acts first.
    ///
    /// # Errors
    ///
    /// [`SaveError::InvalidUnit`] if an army cannot be rebuilt.
    pub fn from_save(
        config: BattleConfig,
        mode: BattleMode,
        data: SaveData,
    ) -> std::result::Result<Self, SaveError> {
        let SaveData {
            armies: [one, two],
            active_team,
        } = data;
        let army_one = Army::new(one)?;
        let army_two = Army::new(two)?;
        let mut session = Self::new(config, mode, army_one, army_two);
        session.turn.reset_to(active_team);
        Ok(session)
    }

    /// Load a session from a save file. Nothing is built unless the whole
    /// file is valid.
    ///
    /// # Errors
    ///
    /// Any [`SaveError`] from reading or validating the file.
    pub fn load(
        path: &Path,
        config: BattleConfig,
        mode: BattleMode,
    ) -> std::result::Result<Self, SaveError> {
        let data = save::load_from_path(path)?;
        Self::from_save(config, mode, data)
    }

    /// Snapshot of the live units and the active team.
    #[must_use]
    pub fn save_data(&self) -> SaveData {
        let army = |team: Team| -> Vec<Unit> {
            self.battlefield
                .units_of(team)
                .map(|(_, _, unit)| unit.clone())
                .collect()
        };
        SaveData {
            armies: [army(Team::One), army(Team::Two)],
            active_team: self.turn.active_team(),
        }
    }

    /// Save the session atomically.
    ///
    /// # Errors
    ///
    /// [`SaveError::ArmySize`] once a team is wiped out, or any IO error.
    pub fn save(&self, path: &Path) -> std::result::Result<(), SaveError> {
        save::save_to_path(path, &self.save_data())
    }

    /// The battlefield.
    #[must_use]
    pub fn battlefield(&self) -> &Battlefield {
        &self.battlefield
    }

    /// The turn machine.
    #[must_use]
    pub fn turn(&self) -> &TurnMachine {
        &self.turn
    }

    /// Who controls each team.
    #[must_use]
    pub const fn mode(&self) -> BattleMode {
        self.mode
    }

    /// Settings in effect.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Turns completed so far, by either team.
    #[must_use]
    pub const fn turns_played(&self) -> u32 {
        self.turns_played
    }

    /// Whether one side has been wiped out.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.turn.is_over()
    }

    /// Outcome once the battle is over.
    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.is_over()
            .then(|| BattleOutcome::from_battlefield(&self.battlefield))
    }

    /// Renderer snapshot.
    #[must_use]
    pub fn view(&self) -> BattleView {
        BattleView::capture(&self.battlefield, &self.turn)
    }

    /// Feed a human intent, then let the AI play any turns that follow.
    ///
    /// # Errors
    ///
    /// [`TurnError::NotAllowed`] if the active team is AI-controlled, or
    /// anything [`TurnMachine::handle`] rejects.
    pub fn handle(&mut self, intent: Intent) -> Result<Vec<BattleEvent>> {
        let acknowledging = matches!(intent, Intent::Acknowledge);
        if self.mode.is_ai(self.turn.active_team()) && !acknowledging {
            return Err(TurnError::NotAllowed {
                phase: self.turn.phase(),
                intent: intent.name(),
            }
            .into());
        }

        let mut events = self.turn.handle(&mut self.battlefield, intent)?;
        self.count_turns(&events);
        events.extend(self.advance_ai());
        Ok(events)
    }

    /// Play AI turns while the team to act is AI-controlled.
    ///
    /// In [`BattleMode::AiVsAi`] the result pause is acknowledged
    /// automatically and this plays exactly one turn per call. In the other
    /// modes it plays the AI turn waiting in [`Phase::UnitSelect`], if any.
    pub fn advance_ai(&mut self) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        if self.is_over() || !self.mode.is_ai(self.turn.active_team()) {
            return events;
        }
        if self.turn.phase() == Phase::Result && self.mode == BattleMode::AiVsAi {
            if let Err(err) = self.turn.handle(&mut self.battlefield, Intent::Acknowledge) {
                tracing::warn!(error = %err, "AI could not dismiss the result pause");
                return events;
            }
        }
        if self.turn.phase() != Phase::UnitSelect {
            return events;
        }

        let team = self.turn.active_team();
        events = AiController::new(team).take_turn(&mut self.battlefield);
        if let Err(err) = self.turn.finish_external_turn(&self.battlefield, &mut events) {
            tracing::warn!(error = %err, "AI turn could not be closed");
        }
        self.count_turns(&events);
        events
    }

    fn count_turns(&mut self, events: &[BattleEvent]) {
        let ended = events
            .iter()
            .filter(|e| matches!(e, BattleEvent::TurnEnded { .. }))
            .count();
        self.turns_played += ended as u32;
    }
}
