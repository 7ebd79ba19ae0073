//! Battle metrics collection for balance analysis.
//!
//! Metrics are computed from the [`BattleEvent`] stream alone, so the same
//! collector works for AI battles, sessions and replays of logged events.

use arena_core::battle::BattleOutcome;
use arena_core::events::BattleEvent;
use arena_core::grid::Team;
use serde::{Deserialize, Serialize};

/// Per-team counters for one battle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMetrics {
    /// Total damage dealt by attacks and area abilities.
    pub damage_dealt: i64,
    /// Total damage taken.
    pub damage_taken: i64,
    /// Single-target hits landed.
    pub hits: u32,
    /// Area-ability hits landed.
    pub area_hits: u32,
    /// Moves made.
    pub moves: u32,
    /// Enemy units defeated.
    pub kills: u32,
    /// Own units lost.
    pub units_lost: u32,
}

/// Complete metrics for a single battle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Rounds (or session turns) played.
    pub rounds: u32,
    /// Winning team (None = draw or unfinished).
    pub winner: Option<Team>,
    /// Whether the battle ended.
    pub finished: bool,
    /// Counters indexed by [`Team::index`].
    pub teams: [TeamMetrics; 2],
    /// Final battlefield hash (for determinism validation).
    pub final_state_hash: u64,
}

impl BattleMetrics {
    /// Create an empty record for a scenario.
    #[must_use]
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            ..Default::default()
        }
    }

    /// Counters of one team.
    #[must_use]
    pub fn team(&self, team: Team) -> &TeamMetrics {
        &self.teams[team.index()]
    }

    fn team_mut(&mut self, team: Team) -> &mut TeamMetrics {
        &mut self.teams[team.index()]
    }

    /// Account for one event.
    pub fn record(&mut self, event: &BattleEvent) {
        match *event {
            BattleEvent::UnitMoved { team, .. } => self.team_mut(team).moves += 1,
            BattleEvent::Attacked { team, damage, .. } => {
                let attacker = self.team_mut(team);
                attacker.hits += 1;
                attacker.damage_dealt += i64::from(damage);
                self.team_mut(team.opponent()).damage_taken += i64::from(damage);
            }
            BattleEvent::AreaHit { team, damage, .. } => {
                let caster = self.team_mut(team);
                caster.area_hits += 1;
                caster.damage_dealt += i64::from(damage);
                self.team_mut(team.opponent()).damage_taken += i64::from(damage);
            }
            BattleEvent::UnitDefeated { team, .. } => {
                self.team_mut(team).units_lost += 1;
                self.team_mut(team.opponent()).kills += 1;
            }
            BattleEvent::BattleOver { winner } => {
                self.finished = true;
                self.winner = winner;
            }
            BattleEvent::TurnEnded { .. } => {}
        }
    }

    /// Account for a batch of events.
    pub fn record_all(&mut self, events: &[BattleEvent]) {
        for event in events {
            self.record(event);
        }
    }

    /// Finalize with the battle's outcome.
    pub fn finalize(&mut self, rounds: u32, outcome: Option<BattleOutcome>, hash: u64) {
        self.rounds = rounds;
        self.finished = outcome.is_some();
        self.winner = outcome.and_then(BattleOutcome::winner);
        self.final_state_hash = hash;
    }

    /// Short human-readable result.
    #[must_use]
    pub fn result_label(&self) -> String {
        match (self.finished, self.winner) {
            (false, _) => "unfinished".to_string(),
            (true, Some(team)) => format!("{team} wins"),
            (true, None) => "draw".to_string(),
        }
    }
}

/// Summary statistics across multiple battles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total battles played.
    pub total_battles: u32,
    /// Battles won, indexed by [`Team::index`].
    pub wins: [u32; 2],
    /// Win rates, indexed by [`Team::index`].
    pub win_rates: [f64; 2],
    /// Draws count.
    pub draws: u32,
    /// Average battle length in rounds.
    pub avg_rounds: f64,
    /// Shortest battle.
    pub min_rounds: u32,
    /// Longest battle.
    pub max_rounds: u32,
    /// Average damage dealt per battle, indexed by [`Team::index`].
    pub avg_damage_dealt: [f64; 2],
    /// Average units lost per battle, indexed by [`Team::index`].
    pub avg_units_lost: [f64; 2],
}

impl BatchSummary {
    /// Calculate summary from a list of battle metrics.
    #[must_use]
    pub fn from_battles(battles: &[BattleMetrics]) -> Self {
        if battles.is_empty() {
            return Self::default();
        }

        let total = battles.len() as f64;
        let mut summary = Self {
            total_battles: battles.len() as u32,
            min_rounds: u32::MAX,
            ..Default::default()
        };

        let mut rounds_sum = 0u64;
        let mut damage = [0i64; 2];
        let mut lost = [0u64; 2];
        for battle in battles {
            rounds_sum += u64::from(battle.rounds);
            summary.min_rounds = summary.min_rounds.min(battle.rounds);
            summary.max_rounds = summary.max_rounds.max(battle.rounds);

            match battle.winner {
                Some(team) => summary.wins[team.index()] += 1,
                None => summary.draws += 1,
            }
            for team in Team::ALL {
                damage[team.index()] += battle.team(team).damage_dealt;
                lost[team.index()] += u64::from(battle.team(team).units_lost);
            }
        }

        summary.avg_rounds = rounds_sum as f64 / total;
        for team in Team::ALL {
            let i = team.index();
            summary.win_rates[i] = f64::from(summary.wins[i]) / total;
            summary.avg_damage_dealt[i] = damage[i] as f64 / total;
            summary.avg_units_lost[i] = lost[i] as f64 / total;
        }
        summary
    }

    /// Check whether both teams win within `threshold` of half the battles.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        self.win_rates.iter().all(|rate| (rate - 0.5).abs() <= threshold)
    }
}
