use std::io::Write;

use anyhow::{Context, Result};

use crate::sync_command::SyncSummary;

/// Presents the outcome of a sync run.
pub trait SummaryPresenter {
    fn show_summary(&mut self, summary: &SyncSummary) -> Result<()>;
}

/// Writes the run summary as an aligned counter list.
pub struct ConsoleSummary<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleSummary<'a, W> {
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> SummaryPresenter for ConsoleSummary<'a, W> {
    fn show_summary(&mut self, summary: &SyncSummary) -> Result<()> {
        writeln!(self.writer, "Processed {} entries:", summary.processed)
            .context("Failed to write summary header")?;
        let lines = [
            ("synced", summary.synced),
            ("skipped (already synced)", summary.already_synced),
            ("skipped (no note)", summary.skipped),
            ("failed", summary.failed),
        ];
        for (label, count) in lines {
            writeln!(self.writer, "- {}: {}", label, count)
                .with_context(|| format!("Failed to write summary line: {}", label))?;
        }

        Ok(())
    }
}
