use std::time::Duration;

use log::debug;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::SyncError;

#[cfg(test)]
use mockall::automock;

/// Bound on one worklog submission. Past this the worklog state is unknown.
pub const SUBMIT_TIMEOUT_SECS: u64 = 30;

/// Downstream sink for one worklog record.
///
/// Submission is fire-once: retries, if any, are the caller's policy, and
/// the caller also owns the ledger write after a success.
#[cfg_attr(test, automock)]
pub trait WorklogSubmitter {
    async fn submit(
        &self,
        ticket_key: &str,
        duration: &str,
        comment: &str,
        started: &str,
    ) -> Result<(), SyncError>;
}

/// Submitter backed by the `jira` executable.
pub struct JiraClient {
    bin: String,
}

impl Default for JiraClient {
    fn default() -> Self {
        Self::with_bin("jira")
    }
}

impl JiraClient {
    pub fn with_bin(bin: &str) -> Self {
        Self {
            bin: bin.to_string(),
        }
    }
}

impl WorklogSubmitter for JiraClient {
    async fn submit(
        &self,
        ticket_key: &str,
        duration: &str,
        comment: &str,
        started: &str,
    ) -> Result<(), SyncError> {
        debug!("Submitting {} to {} (started {})", duration, ticket_key, started);

        let mut command = Command::new(&self.bin);
        command
            .args(["issue", "worklog", "add", ticket_key, duration])
            .args(["--comment", comment])
            .args(["--started", started])
            .arg("--no-input")
            .kill_on_drop(true);

        let output = match timeout(Duration::from_secs(SUBMIT_TIMEOUT_SECS), command.output()).await
        {
            Err(_) => return Err(SyncError::Timeout(SUBMIT_TIMEOUT_SECS)),
            Ok(result) => result.map_err(|err| SyncError::SubmissionRejected(err.to_string()))?,
        };
        if !output.status.success() {
            return Err(SyncError::SubmissionRejected(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }
}
