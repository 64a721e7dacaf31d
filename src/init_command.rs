use anyhow::{Context, Result};
use log::info;

use crate::ledger::{default_ledger_path, SqliteLedger, SyncLedger};

/// Handles the `init` subcommand: create the ledger store and its schema.
///
/// Idempotent, so rerunning it against an existing ledger is harmless.
pub fn run() -> Result<()> {
    let path = default_ledger_path()?;
    let ledger = SqliteLedger::open(&path).context("Failed to open sync ledger")?;
    ledger
        .initialize()
        .context("Failed to initialize sync ledger")?;
    info!("Sync ledger ready at {}", path.display());

    Ok(())
}
