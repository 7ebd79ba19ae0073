//! JSON protocol for headless play.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** intents and queries from the controller
//! **Output (stdout):** events, views and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready",...}` with the opening view
//! 2. The controller sends intents as JSON lines
//! 3. Every accepted intent is answered with the events it caused and the
//!    new view; a rejected one with an error (the battle is unchanged)
//! 4. When a side is wiped out the runner outputs `{"type":"game_over",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","mode":"human_vs_ai","view":{...}}
//! -> {"cmd":"select","x":0,"y":0}
//! <- {"type":"update","events":[],"view":{"phase":"action_select",...}}
//! -> {"cmd":"choose","action":"attack"}
//! <- {"type":"update","events":[],"view":{"phase":"attack_target",...}}
//! -> {"cmd":"target","x":9,"y":0}
//! <- {"type":"error","message":"...","cmd":"target"}
//! -> {"cmd":"hash"}
//! <- {"type":"state_hash","hash":1234}
//! ```

use arena_core::battle::{BattleMode, BattleOutcome};
use arena_core::events::BattleEvent;
use arena_core::grid::{Position, Team};
use arena_core::turn::{Action, Intent};
use arena_core::view::BattleView;
use serde::{Deserialize, Serialize};

/// Protocol version reported in the ready message.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Select the unit on a cell.
    Select { x: i32, y: i32 },

    /// Pick an action for the selected unit.
    Choose { action: Action },

    /// Confirm a move destination or attack target.
    Target { x: i32, y: i32 },

    /// Back out of the current selection.
    Cancel,

    /// Dismiss the result pause.
    Acknowledge,

    /// Let AI-controlled teams play any pending turns.
    Advance,

    /// Current view without changing anything.
    Query,

    /// Battlefield hash (for determinism verification).
    Hash,

    /// Save the session to a file.
    Save { path: String },

    /// Replace the session with one loaded from a save file.
    Load { path: String },

    /// Quit the runner.
    Quit,
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::Choose { .. } => "choose",
            Self::Target { .. } => "target",
            Self::Cancel => "cancel",
            Self::Acknowledge => "acknowledge",
            Self::Advance => "advance",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Save { .. } => "save",
            Self::Load { .. } => "load",
            Self::Quit => "quit",
        }
    }

    /// The turn-machine intent this command carries, if any.
    #[must_use]
    pub fn intent(&self) -> Option<Intent> {
        match *self {
            Self::Select { x, y } => Some(Intent::SelectUnit(Position::new(x, y))),
            Self::Choose { action } => Some(Intent::Choose(action)),
            Self::Target { x, y } => Some(Intent::Target(Position::new(x, y))),
            Self::Cancel => Some(Intent::Cancel),
            Self::Acknowledge => Some(Intent::Acknowledge),
            _ => None,
        }
    }
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        mode: BattleMode,
        view: BattleView,
    },

    /// Acknowledgment of a command with no other answer.
    Ack { cmd: String },

    /// Error processing a command. The battle did not change.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Events caused by a command and the view afterwards.
    Update {
        events: Vec<BattleEvent>,
        view: BattleView,
    },

    /// Current view.
    State { view: BattleView, hash: u64 },

    /// Battlefield hash for determinism verification.
    StateHash { hash: u64 },

    /// The battle has ended.
    GameOver {
        winner: Option<Team>,
        turns: u32,
    },

    /// Goodbye message before shutdown.
    Bye,
}

impl Response {
    /// Create a ready response.
    #[must_use]
    pub fn ready(mode: BattleMode, view: BattleView) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            mode,
            view,
        }
    }

    /// Create an acknowledgment.
    #[must_use]
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Create a game-over response.
    #[must_use]
    pub fn game_over(outcome: BattleOutcome, turns: u32) -> Self {
        Self::GameOver {
            winner: outcome.winner(),
            turns,
        }
    }

    /// Serialize to JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select_command() {
        let cmd = Command::from_json(r#"{"cmd":"select","x":3,"y":4}"#).unwrap();
        assert_eq!(cmd, Command::Select { x: 3, y: 4 });
        assert_eq!(cmd.intent(), Some(Intent::SelectUnit(Position::new(3, 4))));
    }

    #[test]
    fn test_parse_choose_command() {
        let cmd = Command::from_json(r#"{"cmd":"choose","action":"end_turn"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Choose {
                action: Action::EndTurn
            }
        );
    }

    #[test]
    fn test_unit_commands() {
        assert_eq!(Command::from_json(r#"{"cmd":"cancel"}"#).unwrap(), Command::Cancel);
        assert_eq!(Command::from_json(r#"{"cmd":"hash"}"#).unwrap().intent(), None);
        assert!(Command::from_json(r#"{"cmd":"fly"}"#).is_err());
    }

    #[test]
    fn test_serialize_game_over() {
        let json = Response::game_over(BattleOutcome::Winner(Team::Two), 7).to_json_line();
        assert!(json.ends_with('\n'));
        assert!(json.contains(r#""type":"game_over""#));
        assert!(json.contains(r#""winner":"Two""#));
        assert!(json.contains(r#""turns":7"#));
    }

    #[test]
    fn test_serialize_error() {
        let json = Response::error("nope", Some("target")).to_json_line();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""cmd":"target""#));
    }
}
