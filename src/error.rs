use thiserror::Error;

/// Failure taxonomy for a sync run.
///
/// Batch mode absorbs the per-entry kinds (`Skipped`, `SubmissionRejected`,
/// `Timeout`) into the run summary; everything else aborts the run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("required tool `{0}` is not available on PATH")]
    DependencyMissing(String),

    #[error("timetrap invocation failed: {0}")]
    SourceUnavailable(String),

    #[error("could not parse timetrap output: {0}")]
    MalformedResponse(String),

    #[error("no time entries found for the requested range")]
    EmptyResult,

    #[error("no time entry with id {0}")]
    NotFound(i64),

    #[error("sync ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("entry skipped: {0}")]
    Skipped(String),

    #[error("jira rejected the worklog: {0}")]
    SubmissionRejected(String),

    #[error("jira invocation exceeded {0} seconds, worklog state is unknown")]
    Timeout(u64),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SyncError {
    /// Whether this failure is local to one entry in batch mode.
    pub fn is_entry_local(&self) -> bool {
        matches!(
            self,
            SyncError::Skipped(_) | SyncError::SubmissionRejected(_) | SyncError::Timeout(_)
        )
    }
}
