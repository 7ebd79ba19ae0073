//! Headless session runner.
//!
//! Reads JSON commands line by line, feeds them to a [`Session`] and writes
//! one JSON response per line. Nothing is rendered; the controller sees the
//! battle only through the views and events in the responses.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use arena_core::battle::{BattleMode, Session};
use arena_core::error::SaveError;
use arena_core::events::BattleEvent;
use thiserror::Error;

use crate::protocol::{Command, Response};
use crate::scenario::{Scenario, ScenarioError};

/// Failure to set up a runner.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The scenario could not be loaded or built.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The save file could not be loaded.
    #[error("Failed to load save: {0}")]
    Save(#[from] SaveError),
}

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Scenario file to load on startup (built-in skirmish when absent).
    pub scenario_path: Option<PathBuf>,
    /// Save file to resume instead of deploying the scenario armies.
    pub save_path: Option<PathBuf>,
    /// Override of the scenario's controllers.
    pub mode: Option<BattleMode>,
}

/// Drives one session from a stream of commands.
#[derive(Debug)]
pub struct HeadlessRunner {
    session: Session,
    game_over_sent: bool,
    quit: bool,
}

impl HeadlessRunner {
    /// Wrap an existing session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            game_over_sent: false,
            quit: false,
        }
    }

    /// Build the session described by `config`.
    pub fn from_config(config: &HeadlessConfig) -> Result<Self, RunnerError> {
        let scenario = match &config.scenario_path {
            Some(path) => Scenario::load(path)?,
            None => Scenario::skirmish(),
        };
        let mode = match config.mode {
            Some(mode) => mode,
            None => scenario.mode()?,
        };

        let session = match &config.save_path {
            Some(path) => Session::load(path, scenario.config, mode)?,
            None => {
                let (one, two) = scenario.armies()?;
                Session::new(scenario.config, mode, one, two)
            }
        };
        Ok(Self::new(session))
    }

    /// The session being driven.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether a quit command was received.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Responses announcing the session, including any AI turn that opens it.
    pub fn start(&mut self) -> Vec<Response> {
        let mut responses = vec![Response::ready(self.session.mode(), self.session.view())];
        if self.session.mode() != BattleMode::AiVsAi {
            let events = self.session.advance_ai();
            if !events.is_empty() {
                self.push_update(&mut responses, events);
            }
        }
        responses
    }

    /// Execute one command.
    pub fn handle_command(&mut self, cmd: Command) -> Vec<Response> {
        let name = cmd.name();
        let mut responses = Vec::new();

        if let Some(intent) = cmd.intent() {
            match self.session.handle(intent) {
                Ok(events) => self.push_update(&mut responses, events),
                Err(e) => {
                    tracing::debug!(cmd = name, error = %e, "Intent rejected");
                    responses.push(Response::error(e.to_string(), Some(name)));
                }
            }
            return responses;
        }

        match cmd {
            Command::Advance => {
                if self.session.is_over() {
                    responses.push(Response::error("The battle is over", Some(name)));
                } else {
                    let events = self.session.advance_ai();
                    self.push_update(&mut responses, events);
                }
            }
            Command::Query => responses.push(Response::State {
                view: self.session.view(),
                hash: self.session.battlefield().state_hash(),
            }),
            Command::Hash => responses.push(Response::StateHash {
                hash: self.session.battlefield().state_hash(),
            }),
            Command::Save { path } => match self.session.save(Path::new(&path)) {
                Ok(()) => {
                    tracing::info!(path = %path, "Session saved");
                    responses.push(Response::ack(name));
                }
                Err(e) => responses.push(Response::error(e.to_string(), Some(name))),
            },
            Command::Load { path } => {
                let config = *self.session.config();
                match Session::load(Path::new(&path), config, self.session.mode()) {
                    Ok(session) => {
                        tracing::info!(path = %path, "Session loaded");
                        self.session = session;
                        self.game_over_sent = false;
                        responses.push(Response::State {
                            view: self.session.view(),
                            hash: self.session.battlefield().state_hash(),
                        });
                    }
                    Err(e) => responses.push(Response::error(e.to_string(), Some(name))),
                }
            }
            Command::Quit => {
                self.quit = true;
                responses.push(Response::Bye);
            }
            Command::Select { .. }
            | Command::Choose { .. }
            | Command::Target { .. }
            | Command::Cancel
            | Command::Acknowledge => {}
        }
        responses
    }

    /// Parse and execute one input line. Blank lines produce nothing.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match Command::from_json(line) {
            Ok(cmd) => self.handle_command(cmd),
            Err(e) => vec![Response::error(format!("Parse error: {e}"), None)],
        }
    }

    /// Run until a quit command or the end of the input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write_all(&mut output, &self.start())?;

        for line in input.lines() {
            let responses = self.handle_line(&line?);
            write_all(&mut output, &responses)?;
            if self.quit {
                return Ok(());
            }
        }

        write_all(&mut output, &[Response::Bye])
    }

    fn push_update(&mut self, responses: &mut Vec<Response>, events: Vec<BattleEvent>) {
        responses.push(Response::Update {
            events,
            view: self.session.view(),
        });
        if let Some(outcome) = self.session.outcome() {
            if !self.game_over_sent {
                self.game_over_sent = true;
                tracing::info!(winner = ?outcome.winner(), turns = self.session.turns_played(), "Game over");
                responses.push(Response::game_over(outcome, self.session.turns_played()));
            }
        }
    }
}

fn write_all<W: Write>(output: &mut W, responses: &[Response]) -> io::Result<()> {
    for response in responses {
        output.write_all(response.to_json_line().as_bytes())?;
    }
    output.flush()
}
