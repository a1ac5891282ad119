//! Headless Broadside match runner.
//!
//! # Usage
//!
//! ```bash
//! # Single match, report as JSON on stdout
//! cargo run -p broadside_headless -- run --seed 7 --policy-a aggressive
//!
//! # Balance batch
//! cargo run -p broadside_headless -- batch --count 1000 --output results/
//!
//! # Real-time match on the async host, events streamed as JSON lines
//! cargo run -p broadside_headless -- live --speed 4
//!
//! # Same seed several times, compare state hashes
//! cargo run -p broadside_headless -- verify --seed 12345 --runs 5
//!
//! # Parse and validate data files
//! cargo run -p broadside_headless -- validate --config match.ron --cards cards.ron
//! ```
//!
//! Logs go to stderr; stdout only carries JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use broadside_core::prelude::*;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use broadside_headless::{
    batch::{run_batch, BatchConfig},
    live::{run_live, LiveConfig},
    loader::MatchData,
    policy::PolicyKind,
    runner::{MatchRunner, DEFAULT_MAX_TICKS},
};

#[derive(Parser)]
#[command(name = "broadside_headless")]
#[command(about = "Headless Broadside match runner for automated play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Data file overrides shared by every subcommand.
#[derive(Args)]
struct DataArgs {
    /// Match configuration (RON); shipped defaults if omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Card catalog (RON); shipped catalog if omitted
    #[arg(long)]
    cards: Option<PathBuf>,
}

impl DataArgs {
    fn load(&self) -> Option<MatchData> {
        match MatchData::load(self.config.as_deref(), self.cards.as_deref()) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load match data");
                eprintln!("FATAL: {e}");
                None
            }
        }
    }
}

/// Policy selection shared by the match-playing subcommands.
#[derive(Args)]
struct PolicyArgs {
    /// Policy for side A
    #[arg(long, value_enum, default_value = "priority")]
    policy_a: PolicyKind,

    /// Policy for side B
    #[arg(long, value_enum, default_value = "priority")]
    policy_b: PolicyKind,
}

impl PolicyArgs {
    fn kinds(&self) -> PerSide<PolicyKind> {
        PerSide::new(self.policy_a, self.policy_b)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play one match to completion
    Run {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        policies: PolicyArgs,

        /// Policy seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: Tick,

        /// Include the event timeline in the report
        #[arg(long)]
        timeline: bool,
    },

    /// Run a batch of matches for balance testing
    Batch {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        policies: PolicyArgs,

        /// Number of matches
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit per match
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: Tick,

        /// Directory for batch_results.json; summary only on stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play one match in real time on the async host
    Live {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        policies: PolicyArgs,

        /// Policy seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Speed multiplier (1 = real time)
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Tick limit
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: Tick,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        policies: PolicyArgs,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Tick limit per run
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: Tick,
    },

    /// Load and validate the data files without playing
    Validate {
        #[command(flatten)]
        data: DataArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs to stderr; stdout is for JSON output
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let ok = match cli.command {
        Commands::Run {
            data,
            policies,
            seed,
            max_ticks,
            timeline,
        } => cmd_run(&data, &policies, seed, max_ticks, timeline),
        Commands::Batch {
            data,
            policies,
            count,
            parallel,
            seed,
            max_ticks,
            output,
        } => cmd_batch(
            &data,
            BatchConfig {
                games: count,
                seed_start: seed,
                max_ticks,
                policies: policies.kinds(),
                parallel,
            },
            output.as_deref(),
        ),
        Commands::Live {
            data,
            policies,
            seed,
            speed,
            max_ticks,
        } => cmd_live(&data, &policies, seed, LiveConfig { speed, max_ticks }),
        Commands::Verify {
            data,
            policies,
            seed,
            runs,
            max_ticks,
        } => cmd_verify(&data, &policies, seed, runs, max_ticks),
        Commands::Validate { data } => cmd_validate(&data),
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: Serialize>(value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => {
            println!("{json}");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize output");
            false
        }
    }
}

/// Play one match and print its report
fn cmd_run(
    data: &DataArgs,
    policies: &PolicyArgs,
    seed: u64,
    max_ticks: Tick,
    timeline: bool,
) -> bool {
    let Some(data) = data.load() else {
        return false;
    };

    let runner = match MatchRunner::with_kinds(&data, policies.kinds(), seed, max_ticks) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("FATAL: {e}");
            return false;
        }
    };

    let mut report = runner.run();
    if !timeline {
        report.timeline.clear();
    }
    print_json(&report)
}

/// Run a batch and print its summary
fn cmd_batch(data: &DataArgs, config: BatchConfig, output: Option<&Path>) -> bool {
    let Some(data) = data.load() else {
        return false;
    };

    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        count = config.games,
        parallel = config.parallel,
        seed = config.seed_start,
        max_ticks = config.max_ticks,
        cpus_available = num_cpus,
        "Batch configuration"
    );

    let results = run_batch(&data, config);

    if let Some(dir) = output {
        let path = dir.join("batch_results.json");
        if let Err(e) = results.save(&path) {
            tracing::error!(error = %e, path = %path.display(), "Failed to save results");
            eprintln!("FATAL: Failed to save results: {e}");
            return false;
        }
        eprintln!("Results saved to: {}", path.display());
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", summary.games);
    if !results.errors.is_empty() {
        eprintln!("Matches FAILED: {}", results.errors.len());
        for error in results.errors.iter().take(10) {
            eprintln!("  seed {}: {}", error.seed, error.message);
        }
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    for side in Side::ALL {
        eprintln!("  {side}: {:.1}% wins", summary.win_rate(side) * 100.0);
    }
    eprintln!("  undecided: {}", summary.undecided);

    print_json(summary) && results.errors.is_empty()
}

/// Play one match on the async host, streaming events
fn cmd_live(data: &DataArgs, policies: &PolicyArgs, seed: u64, config: LiveConfig) -> bool {
    let Some(data) = data.load() else {
        return false;
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("FATAL: Failed to start async runtime: {e}");
            return false;
        }
    };

    let result = runtime.block_on(run_live(&data, policies.kinds(), seed, config, |event| {
        print_json(event);
    }));
    match result {
        Ok(snapshot) => print_json(&snapshot),
        Err(e) => {
            tracing::error!(error = %e, "Live match failed");
            eprintln!("FATAL: {e}");
            false
        }
    }
}

/// Run one seed repeatedly and compare the results
fn cmd_verify(
    data: &DataArgs,
    policies: &PolicyArgs,
    seed: u64,
    runs: u32,
    max_ticks: Tick,
) -> bool {
    let Some(data) = data.load() else {
        return false;
    };
    tracing::info!("Verifying determinism: seed {} ({} runs)", seed, runs);

    let mut hashes = Vec::with_capacity(runs as usize);
    for _ in 0..runs.max(1) {
        match MatchRunner::with_kinds(&data, policies.kinds(), seed, max_ticks) {
            Ok(runner) => hashes.push(runner.run().final_state_hash),
            Err(e) => {
                eprintln!("FATAL: {e}");
                return false;
            }
        }
    }

    let deterministic = hashes.windows(2).all(|pair| pair[0] == pair[1]);
    if deterministic {
        eprintln!("PASS: All {} runs produced identical results", hashes.len());
    } else {
        eprintln!("FAIL: Non-determinism detected! Hashes: {hashes:x?}");
    }
    deterministic
}

/// Load the data files and report what they contain
fn cmd_validate(data: &DataArgs) -> bool {
    #[derive(Serialize)]
    struct Validated<'a> {
        config: &'a MatchConfig,
        cards: Vec<&'a str>,
    }

    let Some(data) = data.load() else {
        return false;
    };
    let cards = data.catalog.iter().map(|def| def.id.as_str()).collect();
    eprintln!("OK: {} lanes, {} cards", data.config.lane_count, data.catalog.len());
    print_json(&Validated {
        config: &data.config,
        cards,
    })
}
