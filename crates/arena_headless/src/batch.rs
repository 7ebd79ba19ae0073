//! Batch battle runner for balance testing.
//!
//! Runs every scenario of a batch several times in parallel using rayon and
//! collects per-battle metrics plus an aggregate summary. The core is
//! deterministic, so repeated runs alternate which team opens the battle:
//! even runs keep the scenario's `first_team`, odd runs hand the first turn
//! to the other side.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, BattleMetrics};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario files to run. Empty runs the built-in skirmish.
    pub scenarios: Vec<PathBuf>,
    /// Battles per scenario. Odd-numbered runs swap the opening team.
    pub runs_per_scenario: u32,
    /// Worker threads (0 = use rayon default).
    pub parallel: u32,
    /// Override of every scenario's round limit.
    pub max_rounds: Option<i32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenarios: Vec::new(),
            runs_per_scenario: 10,
            parallel: 0,
            max_rounds: None,
        }
    }
}

impl BatchConfig {
    /// Create config for a list of scenario files.
    #[must_use]
    pub fn new(scenarios: Vec<PathBuf>, runs_per_scenario: u32) -> Self {
        Self {
            scenarios,
            runs_per_scenario,
            ..Default::default()
        }
    }

    /// Set worker threads.
    #[must_use]
    pub fn with_parallel(mut self, threads: u32) -> Self {
        self.parallel = threads;
        self
    }

    /// Override the round limit.
    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: i32) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual battle metrics.
    pub battles: Vec<BattleMetrics>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Errors encountered.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Scenario file (or built-in name).
    pub scenario: String,
    /// Run index within the scenario.
    pub run: u32,
    /// Error message.
    pub message: String,
}

/// Progress tracking for batch runs.
#[derive(Debug)]
pub struct BatchProgress {
    total: u32,
    completed: AtomicU32,
    start_time: Instant,
}

impl BatchProgress {
    /// Create a tracker for `total` battles.
    #[must_use]
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a finished battle and return how many are done.
    pub fn record_completion(&self) -> u32 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Battles finished so far.
    #[must_use]
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Completion percentage.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Seconds since the batch started.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

/// A scenario ready to run, with the label used in results.
struct Job {
    label: String,
    scenario: Scenario,
}

/// Play one scenario as an AI battle and collect its metrics.
pub fn run_scenario(label: &str, scenario: &Scenario) -> Result<BattleMetrics, ScenarioError> {
    let mut battle = scenario.battle()?;
    let mut metrics = BattleMetrics::new(label);
    let outcome = battle.run_with(|_, events| metrics.record_all(events));
    metrics.finalize(battle.rounds_played(), Some(outcome), battle.state_hash());
    debug!(
        scenario = label,
        rounds = metrics.rounds,
        result = %metrics.result_label(),
        "Battle finished"
    );
    Ok(metrics)
}

/// Every `.ron` file directly inside `dir`, sorted by name.
pub fn collect_scenario_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "ron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_jobs(config: &BatchConfig, errors: &mut Vec<BatchError>) -> Vec<Job> {
    let mut jobs = Vec::new();
    if config.scenarios.is_empty() {
        let scenario = Scenario::skirmish();
        jobs.push(Job {
            label: scenario.name.clone(),
            scenario,
        });
    }
    for path in &config.scenarios {
        let label = path.display().to_string();
        match Scenario::load(path) {
            Ok(scenario) => jobs.push(Job { label, scenario }),
            Err(e) => {
                warn!(scenario = %label, error = %e, "Skipping scenario");
                errors.push(BatchError {
                    scenario: label,
                    run: 0,
                    message: e.to_string(),
                });
            }
        }
    }
    if let Some(max_rounds) = config.max_rounds {
        for job in &mut jobs {
            job.scenario.config.max_rounds = max_rounds;
        }
    }
    jobs
}

/// The scenario as played on run `run`: odd runs open with the other team.
#[must_use]
pub fn scenario_for_run(scenario: &Scenario, run: u32) -> Scenario {
    let mut scenario = scenario.clone();
    if run % 2 == 1 {
        scenario.config.first_team = scenario.config.first_team.opponent();
    }
    scenario
}

fn run_jobs(jobs: &[Job], runs: u32, progress: &BatchProgress) -> Vec<Result<BattleMetrics, BatchError>> {
    let work: Vec<(&Job, u32)> = jobs
        .iter()
        .flat_map(|job| (0..runs).map(move |run| (job, run)))
        .collect();

    work.into_par_iter()
        .map(|(job, run)| {
            let scenario = scenario_for_run(&job.scenario, run);
            debug!(scenario = %job.label, run, first = %scenario.config.first_team, "Starting battle");
            let result = run_scenario(&job.label, &scenario).map_err(|e| {
                warn!(scenario = %job.label, run, error = %e, "Battle failed");
                BatchError {
                    scenario: job.label.clone(),
                    run,
                    message: e.to_string(),
                }
            });
            let completed = progress.record_completion();
            if completed % 50 == 0 {
                info!(
                    completed,
                    total = progress.total,
                    percent = progress.percentage(),
                    "Batch progress"
                );
            }
            result
        })
        .collect()
}

/// Run a batch of battles.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let mut errors = Vec::new();
    let jobs = load_jobs(&config, &mut errors);
    let total = jobs.len() as u32 * config.runs_per_scenario;
    let progress = BatchProgress::new(total);

    info!(
        scenarios = jobs.len(),
        runs = config.runs_per_scenario,
        "Starting batch run"
    );

    let pool = (config.parallel > 0)
        .then(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.parallel as usize)
                .build()
        })
        .transpose()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to the global thread pool");
            None
        });

    let results = match &pool {
        Some(pool) => pool.install(|| run_jobs(&jobs, config.runs_per_scenario, &progress)),
        None => run_jobs(&jobs, config.runs_per_scenario, &progress),
    };

    let mut battles = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(metrics) => battles.push(metrics),
            Err(e) => errors.push(e),
        }
    }

    let summary = BatchSummary::from_battles(&battles);
    let duration_seconds = progress.elapsed_seconds();

    info!(
        battles = battles.len(),
        errors = errors.len(),
        seconds = duration_seconds,
        "Batch complete"
    );

    BatchResults {
        config,
        battles,
        summary,
        duration_seconds,
        errors,
    }
}

/// Outcome of replaying one scenario several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Final battlefield hash of every run.
    pub hashes: Vec<u64>,
    /// Whether all runs ended identically.
    pub deterministic: bool,
}

/// Replay a scenario `runs` times and compare the final battlefield hashes.
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> Result<VerifyReport, ScenarioError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    let mut first: Option<BattleMetrics> = None;
    let mut deterministic = true;

    for run in 0..runs {
        let metrics = run_scenario(&scenario.name, scenario)?;
        hashes.push(metrics.final_state_hash);
        match &first {
            Some(reference) if *reference != metrics => {
                warn!(run, "Run diverged from the first run");
                deterministic = false;
            }
            Some(_) => {}
            None => first = Some(metrics),
        }
    }

    Ok(VerifyReport {
        hashes,
        deterministic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::grid::Team;
    use tempfile::TempDir;

    const DUEL: &str = r#"
        Scenario(
            name: "Sword Duel",
            team_one: (units: [(name: "Roland", primary: Some("Sword"))]),
            team_two: (units: [(name: "Grim", primary: Some("Sword"))]),
        )
    "#;

    fn write_duel(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("duel.ron");
        std::fs::write(&path, DUEL).unwrap();
        path
    }

    #[test]
    fn test_run_scenario_collects_metrics() {
        let scenario = Scenario::from_ron_str(DUEL).unwrap();
        let metrics = run_scenario("duel", &scenario).unwrap();

        assert!(metrics.finished);
        assert_eq!(metrics.winner, Some(Team::One));
        assert_eq!(metrics.team(Team::Two).units_lost, 1);
        assert_eq!(metrics.team(Team::One).damage_dealt, 100);
    }

    #[test]
    fn test_run_batch_from_files() {
        let dir = TempDir::new().unwrap();
        let duel = write_duel(&dir);
        let missing = dir.path().join("missing.ron");

        let results = run_batch(BatchConfig::new(vec![duel, missing], 3).with_parallel(2));

        assert_eq!(results.battles.len(), 3);
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.summary.total_battles, 3);
        assert_eq!(results.summary.wins, [2, 1]);
    }

    #[test]
    fn test_odd_runs_swap_opening_team() {
        let scenario = Scenario::from_ron_str(DUEL).unwrap();
        assert_eq!(scenario_for_run(&scenario, 0), scenario);
        assert_eq!(scenario_for_run(&scenario, 1).config.first_team, Team::Two);
        assert_eq!(scenario_for_run(&scenario, 2).config.first_team, Team::One);

        let swapped = run_scenario("duel", &scenario_for_run(&scenario, 1)).unwrap();
        assert_eq!(swapped.winner, Some(Team::Two));
        assert_eq!(swapped.team(Team::One).units_lost, 1);
    }

    #[test]
    fn test_default_batch_runs_skirmish() {
        let results = run_batch(BatchConfig::new(Vec::new(), 2).with_max_rounds(60));
        assert_eq!(results.battles.len(), 2);
        assert!(results.battles.iter().all(|b| b.scenario == "Standard Skirmish"));
        assert!(results.battles.iter().all(|b| b.rounds <= 60));
    }

    #[test]
    fn test_results_save_and_load() {
        let dir = TempDir::new().unwrap();
        let results = run_batch(BatchConfig::new(vec![write_duel(&dir)], 1));
        let path = dir.path().join("out").join("results.json");

        results.save(&path).unwrap();
        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.battles, results.battles);
        assert_eq!(loaded.config, results.config);
    }

    #[test]
    fn test_collect_scenario_files() {
        let dir = TempDir::new().unwrap();
        write_duel(&dir);
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a.ron"), DUEL).unwrap();

        let files = collect_scenario_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name()?.to_str())
            .collect();
        assert_eq!(names, ["a.ron", "duel.ron"]);
    }

    #[test]
    fn test_verify_determinism() {
        let report = verify_determinism(&Scenario::from_ron_str(DUEL).unwrap(), 3).unwrap();
        assert!(report.deterministic);
        assert_eq!(report.hashes.len(), 3);
        assert!(report.hashes.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_progress() {
        let progress = BatchProgress::new(4);
        progress.record_completion();
        assert_eq!(progress.record_completion(), 2);
        assert!((progress.percentage() - 50.0).abs() < f64::EPSILON);
    }
}
