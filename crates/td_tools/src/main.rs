//! Path Defense - Development Tools

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "td-tools")]
#[command(about = "Development tools for Path Defense")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a level file or a directory of level files
    Validate {
        /// Level file or directory
        #[arg(default_value = "assets/levels")]
        path: PathBuf,

        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path, json } => {
            tracing::info!("Validating levels in: {}", path.display());
            let report = match td_tools::validate::validate_path(&path) {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    return ExitCode::FAILURE;
                }
            };

            if json {
                match serde_json::to_string_pretty(&report) {
                    Ok(text) => println!("{text}"),
                    Err(e) => tracing::error!("Cannot print report: {e}"),
                }
            }

            if report.is_valid() {
                tracing::info!("Validation passed ({} files)", report.files.len());
                ExitCode::SUCCESS
            } else {
                for failed in report.failures() {
                    tracing::error!(
                        "{}: {} issue(s)",
                        failed.path.display(),
                        failed.issues.len()
                    );
                }
                ExitCode::FAILURE
            }
        }
    }
}
