use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::process::Command;

mod console;
mod datetime;
mod duration;
mod error;
mod init_command;
mod jira;
mod ledger;
mod logging;
mod parser;
mod resolver;
mod sync_command;
mod time_entry;
mod timetrap;

use error::SyncError;
use sync_command::{run_sync, SyncArgs};

/// External tools the sync run depends on, with a cheap probe invocation.
const REQUIRED_TOOLS: &[(&str, &str)] = &[("t", "--version"), ("jira", "version")];

/// CLI application for pushing timetrap entries into JIRA worklogs.
///
/// # Examples
/// ```
/// $ cargo run -- init
/// $ cargo run -- sync --date 2024-01-15 --yes
/// $ cargo run -- sync --single-entry --id 42 --force
/// ```
#[derive(Debug, Parser)]
#[clap(version, about, args_conflicts_with_subcommands = true)]
struct Args {
    #[clap(subcommand)]
    subcommand: Option<SubCommands>,

    /// Running with no subcommand behaves like `sync`.
    #[clap(flatten)]
    sync: SyncArgs,
}

#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Initialize the sync ledger and exit.
    Init,
    /// Sync a day's entries (or one entry) into JIRA worklogs.
    Sync(SyncArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.subcommand.unwrap_or(SubCommands::Sync(args.sync));

    match command {
        SubCommands::Init => {
            logging::setup(false)?;
            init_command::run()?;
        }
        SubCommands::Sync(sync) => {
            logging::setup(sync.verbose)?;
            check_dependencies().await?;
            run_sync(sync).await?;
        }
    }

    Ok(())
}

/// Pre-flight: both external tools must be reachable before any entry is
/// touched.
async fn check_dependencies() -> Result<(), SyncError> {
    for (bin, probe) in REQUIRED_TOOLS {
        Command::new(bin)
            .arg(probe)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|_| SyncError::DependencyMissing(bin.to_string()))?;
    }

    Ok(())
}
