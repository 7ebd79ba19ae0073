//! Headless Battle Arena runner.
//!
//! Runs battles without a display, controlled via JSON on stdin/stdout or
//! as AI-vs-AI simulations and batches.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p arena_headless
//!
//! # Play a scenario, or resume a save, over JSON lines
//! cargo run -p arena_headless -- play --scenario scenarios/duel.ron
//! cargo run -p arena_headless -- play --save battle.sav --mode human-vs-ai
//!
//! # Simulate one AI battle and draw every round
//! cargo run -p arena_headless -- simulate scenarios/skirmish.ron --ascii
//!
//! # Balance batch over every scenario in a directory
//! cargo run -p arena_headless -- batch scenarios --runs 100 --output results/batch.json
//!
//! # Check a save file
//! cargo run -p arena_headless -- inspect battle.sav
//! ```
//!
//! Logs go to stderr and honor `RUST_LOG`.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use arena_core::battle::BattleMode;
use arena_core::grid::Team;
use arena_core::items::item_summary;
use arena_core::save;
use arena_core::view::{BattleView, Renderer};

use arena_headless::{
    batch::{collect_scenario_files, run_batch, run_scenario, verify_determinism, BatchConfig},
    metrics::BattleMetrics,
    runner::{HeadlessConfig, HeadlessRunner},
    AsciiConfig, AsciiRenderer, Scenario,
};

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless Battle Arena runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Who controls each army.
#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    HumanVsHuman,
    HumanVsAi,
    AiVsAi,
}

impl From<ModeArg> for BattleMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::HumanVsHuman => BattleMode::HumanVsHuman,
            ModeArg::HumanVsAi => BattleMode::HumanVsAi,
            ModeArg::AiVsAi => BattleMode::AiVsAi,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play a session over JSON lines on stdin/stdout
    Play {
        /// Scenario file to load (built-in skirmish when absent)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Save file to resume
        #[arg(long)]
        save: Option<PathBuf>,

        /// Override the scenario's controllers
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Run one AI-vs-AI battle to the end
    Simulate {
        /// Scenario file (built-in skirmish when absent)
        scenario: Option<PathBuf>,

        /// Draw the battlefield after every round
        #[arg(long)]
        ascii: bool,

        /// Disable ANSI colors in ASCII output
        #[arg(long)]
        no_color: bool,

        /// Override the round limit
        #[arg(long)]
        max_rounds: Option<i32>,

        /// Print the battle metrics as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Run a batch of AI battles for balance testing
    Batch {
        /// Scenario files or directories of `.ron` files
        paths: Vec<PathBuf>,

        /// Battles per scenario (odd runs let the other team open)
        #[arg(short, long, default_value = "10")]
        runs: u32,

        /// Maximum parallel battles (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Override every scenario's round limit
        #[arg(long)]
        max_rounds: Option<i32>,

        /// Output JSON file for results
        #[arg(short, long, default_value = "results/batch_results.json")]
        output: PathBuf,
    },

    /// Verify that a scenario replays identically
    Verify {
        /// Scenario file (built-in skirmish when absent)
        scenario: Option<PathBuf>,

        /// Number of runs to compare
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Print the contents of a save file
    Inspect {
        /// Save file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr, stdout is for the protocol
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Play {
            scenario,
            save,
            mode,
        }) => cmd_play(scenario, save, mode),
        Some(Commands::Simulate {
            scenario,
            ascii,
            no_color,
            max_rounds,
            json,
        }) => cmd_simulate(scenario, ascii, no_color, max_rounds, json),
        Some(Commands::Batch {
            paths,
            runs,
            parallel,
            max_rounds,
            output,
        }) => cmd_batch(paths, runs, parallel, max_rounds, output),
        Some(Commands::Verify { scenario, runs }) => cmd_verify(scenario, runs),
        Some(Commands::Inspect { file }) => cmd_inspect(file),
        None => cmd_play(None, None, None),
    }
}

fn load_scenario(path: Option<PathBuf>) -> Scenario {
    match path {
        Some(path) => match Scenario::load(&path) {
            Ok(scenario) => scenario,
            Err(e) => {
                eprintln!("Failed to load scenario: {e}");
                std::process::exit(1);
            }
        },
        None => Scenario::skirmish(),
    }
}

/// Play a session over stdin/stdout
fn cmd_play(scenario: Option<PathBuf>, save: Option<PathBuf>, mode: Option<ModeArg>) {
    tracing::info!("Starting interactive session");

    let config = HeadlessConfig {
        scenario_path: scenario,
        save_path: save,
        mode: mode.map(BattleMode::from),
    };
    let mut runner = match HeadlessRunner::from_config(&config) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to start session: {e}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    if let Err(e) = runner.run(stdin.lock(), io::stdout().lock()) {
        tracing::error!(error = %e, "Session aborted");
        std::process::exit(1);
    }
}

/// Run one AI battle to the end
fn cmd_simulate(
    scenario: Option<PathBuf>,
    ascii: bool,
    no_color: bool,
    max_rounds: Option<i32>,
    json: bool,
) {
    let mut scenario = load_scenario(scenario);
    if let Some(max_rounds) = max_rounds {
        scenario.config.max_rounds = max_rounds;
    }
    tracing::info!(scenario = %scenario.name, "Simulating battle");

    let metrics = if ascii {
        simulate_ascii(&scenario, !no_color)
    } else {
        run_scenario(&scenario.name, &scenario)
    };
    let metrics = match metrics {
        Ok(metrics) => metrics,
        Err(e) => {
            eprintln!("Failed to run scenario: {e}");
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&metrics) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Failed to serialize metrics: {e}");
                std::process::exit(1);
            }
        }
    }

    eprintln!("{}: {} after {} rounds", metrics.scenario, metrics.result_label(), metrics.rounds);
    for team in Team::ALL {
        let stats = metrics.team(team);
        eprintln!(
            "  {team}: dealt {} damage, lost {} units",
            stats.damage_dealt, stats.units_lost
        );
    }
}

fn simulate_ascii(
    scenario: &Scenario,
    use_color: bool,
) -> Result<BattleMetrics, arena_headless::scenario::ScenarioError> {
    let mut battle = scenario.battle()?;
    let mut metrics = BattleMetrics::new(scenario.name.clone());
    let mut renderer = AsciiRenderer::new(
        io::stdout(),
        AsciiConfig {
            use_color,
            ..AsciiConfig::default()
        },
    );

    let first = battle.config().first_team;
    renderer.redraw(&BattleView::observe(battle.battlefield(), first, None));

    let mut round = 0;
    let outcome = battle.run_with(|bf, events| {
        round += 1;
        metrics.record_all(events);
        let message = events.last().map(|e| format!("Round {round}: {}", e.describe()));
        renderer.redraw(&BattleView::observe(bf, first, message));
    });
    metrics.finalize(battle.rounds_played(), Some(outcome), battle.state_hash());
    Ok(metrics)
}

/// Run a batch of AI battles
fn cmd_batch(
    paths: Vec<PathBuf>,
    runs: u32,
    parallel: u32,
    max_rounds: Option<i32>,
    output: PathBuf,
) {
    let mut scenarios = Vec::new();
    for path in paths {
        if path.is_dir() {
            match collect_scenario_files(&path) {
                Ok(files) => scenarios.extend(files),
                Err(e) => {
                    eprintln!("Failed to read {}: {e}", path.display());
                    std::process::exit(1);
                }
            }
        } else {
            scenarios.push(path);
        }
    }

    let mut config = BatchConfig::new(scenarios, runs).with_parallel(parallel);
    config.max_rounds = max_rounds;
    let results = run_batch(config);

    if let Err(e) = results.save(&output) {
        tracing::error!(error = %e, path = %output.display(), "Failed to save results");
        eprintln!("FATAL: Failed to save results: {e}");
        std::process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Battles played: {}", results.battles.len());
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Rounds: avg {:.1}, min {}, max {}",
        summary.avg_rounds, summary.min_rounds, summary.max_rounds
    );
    eprintln!("\nWin Rates:");
    for team in Team::ALL {
        eprintln!("  {team}: {:.1}%", summary.win_rates[team.index()] * 100.0);
    }
    eprintln!("  Draws: {}", summary.draws);

    if !results.errors.is_empty() {
        eprintln!("\nFAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!("  {} (run {}): {}", error.scenario, error.run, error.message);
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", output.display());
}

/// Verify determinism by replaying a scenario
fn cmd_verify(scenario: Option<PathBuf>, runs: u32) {
    let scenario = load_scenario(scenario);
    tracing::info!(scenario = %scenario.name, runs, "Verifying determinism");

    match verify_determinism(&scenario, runs) {
        Ok(report) if report.deterministic => {
            eprintln!("PASS: All {runs} runs produced identical results");
            if let Some(hash) = report.hashes.first() {
                eprintln!("  Final hash: {hash:016x}");
            }
        }
        Ok(report) => {
            eprintln!("FAIL: Non-determinism detected!");
            for (run, hash) in report.hashes.iter().enumerate() {
                eprintln!("  Run {run}: {hash:016x}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to run scenario: {e}");
            std::process::exit(1);
        }
    }
}

/// Print a save file
fn cmd_inspect(file: PathBuf) {
    let data = match save::load_from_path(&file) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to load save: {e}");
            std::process::exit(1);
        }
    };

    println!("Save file: {}", file.display());
    println!("Active team: {}", data.active_team);
    for team in Team::ALL {
        let units = data.army(team);
        println!("\n{team} ({} units)", units.len());
        for unit in units {
            println!(
                "  {:<16} HP {:>4}  {} / {}",
                unit.name(),
                unit.health,
                item_summary(Some(unit.primary())),
                item_summary(unit.secondary()),
            );
        }
    }
}
