//! Headless tower-defense match runner.
//!
//! Runs matches without graphics, controlled via JSON on stdin/stdout or by
//! a scripted plan. Designed for the HUD/input bridge, CI testing and replay
//! verification.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p td_headless -- play --level assets/levels/green_plains.ron
//!
//! # Run a scripted match and keep the replay
//! cargo run -p td_headless -- run --plan plan.ron --record match.replay
//!
//! # Verify a replay
//! cargo run -p td_headless -- replay --file match.replay --verify
//!
//! # Check determinism
//! cargo run -p td_headless -- verify --plan plan.ron --runs 8
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use td_core::replay::ReplayPlayer;
use td_headless::{
    interactive::serve,
    level_loader::load_level,
    plan::MatchPlan,
    replay_file::{load_replay, save_replay},
    runner::{MatchRunner, DEFAULT_MAX_TICKS},
    verify::verify_determinism,
};

const DEFAULT_LEVEL: &str = "assets/levels/green_plains.ron";

#[derive(Parser)]
#[command(name = "td_headless")]
#[command(about = "Headless tower-defense match runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a match interactively over stdin/stdout
    Play {
        /// Level file (.ron or .json)
        #[arg(short, long, default_value = DEFAULT_LEVEL)]
        level: PathBuf,
    },

    /// Run a scripted match and print its report
    Run {
        /// Level file (.ron or .json)
        #[arg(short, long, default_value = DEFAULT_LEVEL)]
        level: PathBuf,

        /// Plan file (RON); without one no towers are placed
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Stop after this many ticks
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,

        /// Save the recorded replay to this file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Replay a recorded match
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify replay produces identical hash
        #[arg(long)]
        verify: bool,
    },

    /// Verify determinism by running the same match several times
    Verify {
        /// Level file (.ron or .json)
        #[arg(short, long, default_value = DEFAULT_LEVEL)]
        level: PathBuf,

        /// Plan file (RON)
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Stop each run after this many ticks
        #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
        max_ticks: u64,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for protocol and reports
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Play { level } => cmd_play(&level),
        Commands::Run {
            level,
            plan,
            max_ticks,
            record,
        } => cmd_run(&level, plan.as_deref(), max_ticks, record.as_deref()),
        Commands::Replay { file, verify } => cmd_replay(&file, verify),
        Commands::Verify {
            level,
            plan,
            runs,
            max_ticks,
        } => cmd_verify(&level, plan.as_deref(), runs, max_ticks),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_plan(path: Option<&Path>) -> Result<MatchPlan, td_headless::PlanError> {
    match path {
        Some(path) => {
            tracing::info!("Using plan: {}", path.display());
            MatchPlan::load(path)
        }
        None => Ok(MatchPlan::idle()),
    }
}

/// Play interactively over stdin/stdout
fn cmd_play(level_path: &Path) -> CliResult {
    let level = load_level(level_path)?;
    tracing::info!("Starting interactive session on '{}'", level.name);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let summary = serve(&level, stdin.lock(), stdout.lock())?;

    tracing::info!(outcome = ?summary.outcome, score = summary.score, "Session closed");
    Ok(())
}

/// Run a scripted match
fn cmd_run(
    level_path: &Path,
    plan_path: Option<&Path>,
    max_ticks: u64,
    record: Option<&Path>,
) -> CliResult {
    let level = load_level(level_path)?;
    let plan = load_plan(plan_path)?;

    let mut runner = MatchRunner::new(&level, plan)?.with_max_ticks(max_ticks);
    let report = runner.run();

    if !report.finished {
        tracing::warn!(max_ticks, "Tick limit reached before the match ended");
    }
    for refused in &report.refused {
        tracing::warn!(
            tick = refused.tick,
            tower = %refused.tower,
            reason = %refused.reason,
            "Placement refused"
        );
    }

    if let Some(path) = record {
        save_replay(runner.replay(), path)?;
        tracing::info!("Replay saved to {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Replay a recorded match
fn cmd_replay(file: &Path, verify: bool) -> CliResult {
    if verify {
        tracing::info!("Verifying replay: {}", file.display());
    } else {
        tracing::info!("Playing replay: {}", file.display());
    }

    let replay = load_replay(file)?;

    eprintln!("Loaded replay:");
    eprintln!("  Level: {}", replay.level_id);
    eprintln!("  Commands: {}", replay.command_count());
    eprintln!("  Duration: {} ticks", replay.duration());

    let mut player = ReplayPlayer::new(replay)?;

    if verify {
        eprintln!("Verifying replay...");
        let matched = player.verify()?;
        let expected = player.replay().final_hash;
        let actual = player.state().state_hash();
        if !matched {
            eprintln!("FAIL: Replay produced different hash!");
            eprintln!("  Expected: {expected:016x}");
            eprintln!("  Actual:   {actual:016x}");
            return Err("replay verification failed".into());
        }
        eprintln!("PASS: Replay verification successful");
        eprintln!("  Expected hash: {expected:016x}");
        eprintln!("  Actual hash:   {actual:016x}");
    } else {
        let mut last_decile = 0;
        while player.advance() {
            let decile = (player.progress_percent() / 10.0) as u32;
            if decile > last_decile {
                eprintln!("Progress: {}%", decile * 10);
                last_decile = decile;
            }
        }

        eprintln!("Replay complete at tick {}", player.current_tick());
        eprintln!("Final state hash: {:016x}", player.state().state_hash());
    }

    println!("{}", serde_json::to_string_pretty(&player.state().summary())?);
    Ok(())
}

/// Verify determinism
fn cmd_verify(level_path: &Path, plan_path: Option<&Path>, runs: usize, max_ticks: u64) -> CliResult {
    let level = load_level(level_path)?;
    let plan = load_plan(plan_path)?;

    tracing::info!("Verifying determinism: '{}' ({} runs)", level.name, runs);

    let report = verify_determinism(&level, &plan, runs.max(2), max_ticks)?;

    if report.is_deterministic() {
        eprintln!("PASS: All {} runs produced identical results", report.runs);
        Ok(())
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        eprintln!("  Hashes: {:?}", report.hashes);
        Err("runs diverged".into())
    }
}
