//! # Arena Core
//!
//! Deterministic battle core for Battle Arena, a turn-based tactics game
//! played by two armies of up to five units on a small grid.
//!
//! This crate contains **only** the rules of the game:
//! - No rendering (renderers implement [`view::Renderer`])
//! - No input polling (front ends feed [`turn::Intent`] values)
//! - No randomness and no artificial delays
//! - No IO apart from the fixed-record save file in [`save`]
//!
//! This separation enables:
//! - Headless AI-vs-AI batches
//! - Terminal or JSON front ends sharing one rule set
//! - Determinism testing via [`battlefield::Battlefield::state_hash`]
//!
//! ## Crate Structure
//!
//! - [`items`] - Immutable item catalog
//! - [`unit`] / [`army`] - Combatants and army setup validation
//! - [`roster`] - Bounded, order-preserving per-team position list
//! - [`battlefield`] - The grid and its spatial operations
//! - [`rules`] - Movement, attack, damage and area-ability rules
//! - [`turn`] - Turn/action state machine
//! - [`ai`] - Nearest-target AI controller
//! - [`battle`] - Battle loop, sessions and outcomes
//! - [`save`] - Fixed binary save format

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod army;
pub mod battle;
pub mod battlefield;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod items;
pub mod roster;
pub mod rules;
pub mod save;
pub mod turn;
pub mod unit;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiController, AiDecision};
    pub use crate::army::{Army, UnitSpec};
    pub use crate::battle::{Battle, BattleMode, BattleOutcome, Controller, Session};
    pub use crate::battlefield::{Battlefield, Occupant, UnitId};
    pub use crate::config::BattleConfig;
    pub use crate::error::{GameError, GridError, Result, RuleViolation, SaveError, SetupError};
    pub use crate::events::BattleEvent;
    pub use crate::grid::{Position, Team};
    pub use crate::items::{find_item, Item, ItemId, CATALOG};
    pub use crate::roster::Roster;
    pub use crate::turn::{Action, Intent, Phase, TurnMachine};
    pub use crate::unit::Unit;
    pub use crate::view::{BattleView, Renderer};
}
