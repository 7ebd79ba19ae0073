//! Scenario loading and configuration.
//!
//! Scenarios name two armies by unit and catalog item names, say who
//! controls each army, and optionally override the battle settings.
//!
//! # Example RON
//!
//! ```ron
//! Scenario(
//!     name: "Duel",
//!     config: (max_rounds: 50),
//!     team_one: (
//!         controller: Human,
//!         units: [(name: "Roland", primary: Some("Sword"), secondary: Some("Shield"))],
//!     ),
//!     team_two: (
//!         units: [(name: "Grim", primary: Some("Axe"))],
//!     ),
//! )
//! ```

use std::path::Path;

use arena_core::army::{Army, UnitSpec};
use arena_core::battle::{Battle, BattleMode, Session};
use arena_core::config::BattleConfig;
use arena_core::error::SetupError;
use arena_core::grid::Team;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// An army could not be assembled.
    #[error("Invalid army for {team}: {source}")]
    Setup {
        /// Team whose army failed.
        team: Team,
        /// Underlying setup failure.
        #[source]
        source: SetupError,
    },
    /// The controller pair has no matching session mode.
    #[error("Unsupported controllers: an AI team 1 cannot face a human team 2")]
    Controllers,
}

/// Who gives the orders for an army.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControllerKind {
    /// Orders arrive as intents.
    Human,
    /// The built-in nearest-target AI.
    #[default]
    Ai,
}

/// One side of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSetup {
    /// Who controls this army.
    #[serde(default)]
    pub controller: ControllerKind,
    /// Units in deployment order.
    pub units: Vec<UnitSpec>,
}

impl TeamSetup {
    /// AI-controlled army.
    #[must_use]
    pub fn ai(units: Vec<UnitSpec>) -> Self {
        Self {
            controller: ControllerKind::Ai,
            units,
        }
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Battle settings.
    #[serde(default)]
    pub config: BattleConfig,
    /// Army deployed on the left edge.
    pub team_one: TeamSetup,
    /// Army deployed on the right edge.
    pub team_two: TeamSetup,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario = Self::from_ron_str(&contents)?;
        tracing::debug!(path = %path.display(), name = %scenario.name, "Scenario loaded");
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Standard five-a-side battle between two AI armies.
    #[must_use]
    pub fn skirmish() -> Self {
        let specs = |units: &[(&str, &str, Option<&str>)]| -> Vec<UnitSpec> {
            units
                .iter()
                .map(|&(name, primary, secondary)| {
                    let spec = UnitSpec::new(name, primary);
                    match secondary {
                        Some(item) => spec.with_secondary(item),
                        None => spec,
                    }
                })
                .collect()
        };

        Self {
            name: "Standard Skirmish".to_string(),
            description: "Five mixed units per side on the full grid".to_string(),
            config: BattleConfig {
                max_rounds: 200,
                ..BattleConfig::default()
            },
            team_one: TeamSetup::ai(specs(&[
                ("Roland", "Sword", Some("Shield")),
                ("Oliver", "Spear", Some("Dagger")),
                ("Aude", "Bow", Some("Staff")),
                ("Turpin", "Fireball Staff", None),
                ("Naimes", "Greatsword", None),
            ])),
            team_two: TeamSetup::ai(specs(&[
                ("Marsile", "Axe", Some("Shield")),
                ("Blancandrin", "Mace", Some("Dagger")),
                ("Falsaron", "Crossbow", None),
                ("Chernuble", "Ice Staff", None),
                ("Baligant", "Hammer", None),
            ])),
        }
    }

    /// Build both armies.
    pub fn armies(&self) -> Result<(Army, Army), ScenarioError> {
        let build = |team: Team, setup: &TeamSetup| {
            Army::from_specs(&setup.units).map_err(|source| ScenarioError::Setup { team, source })
        };
        Ok((
            build(Team::One, &self.team_one)?,
            build(Team::Two, &self.team_two)?,
        ))
    }

    /// Session mode matching the two controllers.
    pub fn mode(&self) -> Result<BattleMode, ScenarioError> {
        match (self.team_one.controller, self.team_two.controller) {
            (ControllerKind::Human, ControllerKind::Human) => Ok(BattleMode::HumanVsHuman),
            (ControllerKind::Human, ControllerKind::Ai) => Ok(BattleMode::HumanVsAi),
            (ControllerKind::Ai, ControllerKind::Ai) => Ok(BattleMode::AiVsAi),
            (ControllerKind::Ai, ControllerKind::Human) => Err(ScenarioError::Controllers),
        }
    }

    /// An AI-vs-AI battle, whatever the controllers say.
    pub fn battle(&self) -> Result<Battle, ScenarioError> {
        let (one, two) = self.armies()?;
        Ok(Battle::new(self.config, one, two))
    }

    /// An interactive session honoring the controllers.
    pub fn session(&self) -> Result<Session, ScenarioError> {
        let mode = self.mode()?;
        let (one, two) = self.armies()?;
        Ok(Session::new(self.config, mode, one, two))
    }
}
