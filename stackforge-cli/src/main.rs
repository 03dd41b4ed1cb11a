//! StackForge: resumable SaaS provisioning runs from the command line.
//!
//! # Usage
//!
//! ```text
//! stackforge start <run> [--project <name>] [--description <text>]
//!                        [--credential platform=token]... [--credentials-file <json>]
//! stackforge next <run> [--json] [--exec]
//! stackforge status [<run>] [--json]
//! stackforge stages
//! stackforge history <run> [--json]
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    history::HistoryArgs, next::NextArgs, stages::StagesArgs, start::StartArgs,
    status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stackforge",
    version,
    about = "Drive a SaaS provisioning run one stage at a time",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a run and record its build configuration.
    Start(StartArgs),

    /// Advance a run by one stage and print what it produced.
    Next(NextArgs),

    /// Show where each stored run stands.
    Status(StatusArgs),

    /// List the provisioning stages in order.
    Stages(StagesArgs),

    /// Print a run's history, credentials masked.
    History(HistoryArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Start(args) => args.run(),
        Commands::Next(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Stages(args) => args.run(),
        Commands::History(args) => args.run(),
    }
}
