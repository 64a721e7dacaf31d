use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use log::{debug, error, info};

use crate::console::{ConsoleSummary, SummaryPresenter};
use crate::datetime::format_worklog_started;
use crate::duration::format_jira_duration;
use crate::error::SyncError;
use crate::jira::{JiraClient, WorklogSubmitter};
use crate::ledger::{SqliteLedger, SyncLedger};
use crate::parser::{parse_note, ReferenceResolver};
use crate::resolver::{AutoSkipResolver, PromptResolver};
use crate::time_entry::TimeEntry;
use crate::timetrap::{EntrySource, TimetrapClient};

/// Arguments of the `sync` subcommand (also the default command).
#[derive(Debug, clap::Args)]
pub struct SyncArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        value_parser = parse_date,
    )]
    pub date: Option<NaiveDate>,

    #[clap(
        short = 'y',
        long = "yes",
        help = "Never prompt; skip entries without a ticket reference"
    )]
    pub yes: bool,

    #[clap(short = 'v', long = "verbose", help = "Show informational detail")]
    pub verbose: bool,

    #[clap(
        long = "single-entry",
        requires = "id",
        help = "Sync exactly one entry instead of a day's worth"
    )]
    pub single_entry: bool,

    #[clap(
        long = "id",
        value_name = "N",
        requires = "single_entry",
        help = "Entry id to sync"
    )]
    pub id: Option<i64>,

    #[clap(
        short = 'f',
        long = "force",
        help = "Resubmit entries already recorded in the ledger"
    )]
    pub force: bool,
}

/// Immutable per-run configuration, passed explicitly instead of being read
/// from ambient state.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunConfig {
    pub force: bool,
    pub non_interactive: bool,
}

/// Aggregate counters of one run.
///
/// Invariant: `synced + already_synced + skipped + failed == processed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub processed: usize,
    pub synced: usize,
    pub already_synced: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Outcome of the per-entry pipeline when it does not fail.
enum EntryOutcome {
    Synced,
    AlreadySynced,
    SkippedNoNote,
}

/// Drives the sync pipeline: ledger check, parse, duration, submit, record.
///
/// Batch and single-entry modes share the same per-entry pipeline; whether a
/// per-entry failure is fatal is the only difference between them.
pub struct SyncCommand<'a, S, L, W, R>
where
    S: EntrySource,
    L: SyncLedger,
    W: WorklogSubmitter,
    R: ReferenceResolver,
{
    source: &'a S,
    ledger: &'a L,
    submitter: &'a W,
    resolver: R,
    config: RunConfig,
}

impl<'a, S, L, W, R> SyncCommand<'a, S, L, W, R>
where
    S: EntrySource,
    L: SyncLedger,
    W: WorklogSubmitter,
    R: ReferenceResolver,
{
    pub fn new(source: &'a S, ledger: &'a L, submitter: &'a W, resolver: R, config: RunConfig) -> Self {
        Self {
            source,
            ledger,
            submitter,
            resolver,
            config,
        }
    }

    /// Syncs every entry recorded on `date`.
    ///
    /// The retrieval window is `[date, date + 1 day)`. Per-entry failures
    /// are counted and logged; only fetch and ledger failures abort the run.
    pub async fn run_batch(&mut self, date: NaiveDate) -> Result<SyncSummary, SyncError> {
        let end = date + chrono::Duration::days(1);
        debug!("Fetching entries in [{}, {})", date, end);

        let entries = match self.source.fetch_range(date, end).await {
            Ok(entries) => entries,
            Err(SyncError::EmptyResult) => {
                info!("No entries recorded for {}, nothing to sync", date);
                return Ok(SyncSummary::default());
            }
            Err(err) => return Err(err),
        };
        info!("Fetched {} entries for {}", entries.len(), date);

        let mut summary = SyncSummary::default();
        for entry in &entries {
            summary.processed += 1;
            match self.process_entry(entry).await {
                Ok(EntryOutcome::Synced) => summary.synced += 1,
                Ok(EntryOutcome::AlreadySynced) => summary.already_synced += 1,
                Ok(EntryOutcome::SkippedNoNote) => summary.skipped += 1,
                Err(err) if err.is_entry_local() => {
                    error!("Entry {}: {}", entry.display_id(), err);
                    summary.failed += 1;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(summary)
    }

    /// Syncs exactly one entry; any stage failure is fatal.
    pub async fn run_single(&mut self, id: i64) -> Result<SyncSummary, SyncError> {
        let entry = self.source.fetch_entry(id).await?;

        let mut summary = SyncSummary {
            processed: 1,
            ..SyncSummary::default()
        };
        match self.process_entry(&entry).await? {
            EntryOutcome::Synced => summary.synced = 1,
            EntryOutcome::AlreadySynced => summary.already_synced = 1,
            EntryOutcome::SkippedNoNote => summary.skipped = 1,
        }

        Ok(summary)
    }

    async fn process_entry(&mut self, entry: &TimeEntry) -> Result<EntryOutcome, SyncError> {
        if let Some(id) = entry.id {
            if !self.config.force && self.ledger.is_synced(id)? {
                info!("Entry {} already synced, skipping", id);
                return Ok(EntryOutcome::AlreadySynced);
            }
        } else {
            debug!("Entry has no id; duplicate detection skipped");
        }

        let Some(note) = entry.note_text() else {
            info!("Entry {} has no note, skipping", entry.display_id());
            return Ok(EntryOutcome::SkippedNoNote);
        };

        let parsed = parse_note(note, &mut self.resolver)?;
        let duration = format_jira_duration(entry.duration_seconds());
        let started = entry
            .started_at()
            .map(|at| format_worklog_started(&at))
            .map_err(|err| {
                SyncError::Skipped(format!(
                    "entry {} has an unparseable start timestamp: {}",
                    entry.display_id(),
                    err
                ))
            })?;

        debug!(
            "Submitting {} to {}: {}",
            duration, parsed.ticket_key, parsed.description
        );
        self.submitter
            .submit(&parsed.ticket_key, &duration, &parsed.description, &started)
            .await?;
        info!(
            "Logged {} to {} for entry {}",
            duration,
            parsed.ticket_key,
            entry.display_id()
        );

        if let Some(id) = entry.id {
            if let Err(err) = self.ledger.mark_synced(id) {
                // the worklog now exists remotely but is not recorded locally
                error!(
                    "Worklog for entry {} was submitted but could not be recorded; \
                     it may be submitted again on a future run",
                    id
                );
                return Err(err);
            }
        }

        Ok(EntryOutcome::Synced)
    }
}

/// Wires the real clients together and runs the requested mode.
pub async fn run_sync(args: SyncArgs) -> Result<()> {
    if args.single_entry != args.id.is_some() {
        return Err(SyncError::InvalidArgument(
            "--single-entry and --id must be given together".to_string(),
        )
        .into());
    }

    let config = RunConfig {
        force: args.force,
        non_interactive: args.yes,
    };
    let source = TimetrapClient::default();
    let submitter = JiraClient::default();
    let ledger = SqliteLedger::open_default()?;
    ledger.initialize()?;

    let summary = if config.non_interactive {
        let command = SyncCommand::new(&source, &ledger, &submitter, AutoSkipResolver, config);
        dispatch(command, &args).await?
    } else {
        let resolver = PromptResolver::new(std::io::stdin().lock(), std::io::stderr());
        let command = SyncCommand::new(&source, &ledger, &submitter, resolver, config);
        dispatch(command, &args).await?
    };

    let mut stdout = std::io::stdout();
    ConsoleSummary::new(&mut stdout)
        .show_summary(&summary)
        .context("Failed to write run summary")?;

    Ok(())
}

async fn dispatch<S, L, W, R>(
    mut command: SyncCommand<'_, S, L, W, R>,
    args: &SyncArgs,
) -> Result<SyncSummary, SyncError>
where
    S: EntrySource,
    L: SyncLedger,
    W: WorklogSubmitter,
    R: ReferenceResolver,
{
    match args.id {
        Some(id) if args.single_entry => command.run_single(id).await,
        _ => {
            let date = args.date.unwrap_or_else(|| Local::now().date_naive());
            command.run_batch(date).await
        }
    }
}

/// Parses a `--date` argument.
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}
