//! Batch match runner for balance testing.
//!
//! Runs many seeded matches in parallel with rayon and aggregates the
//! reports into a [`BatchSummary`].

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use broadside_core::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::loader::MatchData;
use crate::policy::PolicyKind;
use crate::runner::{MatchReport, MatchRunner, DEFAULT_MAX_TICKS};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of matches.
    pub games: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Tick limit per match.
    pub max_ticks: Tick,
    /// Policies for each side.
    pub policies: PerSide<PolicyKind>,
    /// Worker threads (0 = rayon default).
    pub parallel: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            games: 100,
            seed_start: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            policies: PerSide::splat(PolicyKind::Priority),
            parallel: 0,
        }
    }
}

/// A match that could not be run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed of the failed match.
    pub seed: u64,
    /// What went wrong.
    pub message: String,
}

/// Aggregate over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches completed.
    pub games: u32,
    /// Wins per side.
    pub wins: PerSide<u32>,
    /// Matches that hit the tick limit.
    pub undecided: u32,
    /// Mean length of decided matches, in ticks.
    pub mean_decided_ticks: f64,
    /// Shortest decided match.
    pub min_decided_ticks: Tick,
    /// Longest decided match.
    pub max_decided_ticks: Tick,
    /// Mean ships launched per match, per side.
    pub mean_launched: PerSide<f64>,
    /// Mean ships sunk per match, per side.
    pub mean_sunk: PerSide<f64>,
}

impl BatchSummary {
    /// Summarize a list of reports.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_reports(reports: &[MatchReport]) -> Self {
        if reports.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            games: reports.len() as u32,
            min_decided_ticks: Tick::MAX,
            ..Self::default()
        };
        let mut decided_ticks = 0;
        let mut launched = PerSide::splat(0u64);
        let mut sunk = PerSide::splat(0u64);

        for report in reports {
            match report.winner {
                Some(side) => {
                    summary.wins[side] += 1;
                    decided_ticks += report.ticks;
                    summary.min_decided_ticks = summary.min_decided_ticks.min(report.ticks);
                    summary.max_decided_ticks = summary.max_decided_ticks.max(report.ticks);
                }
                None => summary.undecided += 1,
            }
            for (side, side_report) in report.sides.iter() {
                launched[side] += u64::from(side_report.stats.launched);
                sunk[side] += u64::from(side_report.stats.sunk);
            }
        }

        let decided = summary.games - summary.undecided;
        if decided == 0 {
            summary.min_decided_ticks = 0;
        } else {
            summary.mean_decided_ticks = decided_ticks as f64 / f64::from(decided);
        }
        let games = f64::from(summary.games);
        summary.mean_launched = PerSide::from_fn(|side| launched[side] as f64 / games);
        summary.mean_sunk = PerSide::from_fn(|side| sunk[side] as f64 / games);
        summary
    }

    /// Share of matches won by `side`.
    #[must_use]
    pub fn win_rate(&self, side: Side) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        f64::from(self.wins[side]) / f64::from(self.games)
    }
}

/// Results of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Per-match reports, ordered by seed.
    pub reports: Vec<MatchReport>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Matches that failed to run.
    pub errors: Vec<BatchError>,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results saved by [`Self::save`].
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of matches.
#[allow(clippy::cast_precision_loss)]
pub fn run_batch(data: &MatchData, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        games = config.games,
        seed_start = config.seed_start,
        policy_a = ?config.policies.a,
        policy_b = ?config.policies.b,
        "Starting batch run"
    );

    let completed = AtomicU32::new(0);
    let run_all = || -> Vec<std::result::Result<MatchReport, BatchError>> {
        (0..config.games)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add(u64::from(i));
                let result = MatchRunner::with_kinds(data, config.policies, seed, config.max_ticks)
                    .map(MatchRunner::run)
                    .map_err(|e| {
                        warn!(seed, error = %e, "Match failed to start");
                        BatchError {
                            seed,
                            message: e.to_string(),
                        }
                    });
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 10 == 0 {
                    debug!("Progress: {}/{}", done, config.games);
                }
                result
            })
            .collect()
    };

    let results = if config.parallel > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using the global one");
                run_all()
            }
        }
    } else {
        run_all()
    };

    let mut reports = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => errors.push(e),
        }
    }

    let summary = BatchSummary::from_reports(&reports);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        reports.len(),
        duration_seconds,
        reports.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        reports,
        summary,
        errors,
        duration_seconds,
    }
}
