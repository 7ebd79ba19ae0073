//! Headless battle runner for AI testing and CI verification.
//!
//! This crate drives the battle core without a display:
//!
//! - **Interactive play**: a controller sends intents as JSON lines on
//!   stdin and receives events and views on stdout
//! - **Balance testing**: AI-vs-AI batches over scenario files, run in
//!   parallel, with per-battle metrics and a summary
//! - **Determinism checks**: replaying a scenario must reproduce the same
//!   final battlefield hash
//!
//! # Protocol
//!
//! - **stdin**: Commands from the controller (select, choose, target, ...)
//! - **stdout**: Responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Play a scenario over JSON lines
//! echo '{"cmd":"select","x":0,"y":0}' | cargo run -p arena_headless -- play --scenario scenarios/duel.ron
//!
//! # Watch an AI battle as ASCII frames
//! cargo run -p arena_headless -- simulate scenarios/skirmish.ron --ascii
//!
//! # Run a balance batch
//! cargo run -p arena_headless -- batch scenarios/ --runs 50 --output results.json
//! ```

pub mod ascii;
pub mod batch;
pub mod metrics;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use ascii::{render_view, AsciiConfig, AsciiRenderer};
pub use batch::{run_batch, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, BattleMetrics};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use scenario::Scenario;
