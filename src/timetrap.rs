use chrono::NaiveDate;
use log::{debug, warn};
use tokio::process::Command;

use crate::error::SyncError;
use crate::time_entry::TimeEntry;

#[cfg(test)]
use mockall::automock;

/// Source of time entries for a sync run.
#[cfg_attr(test, automock)]
pub trait EntrySource {
    /// Entries recorded in `[start, end)`, end exclusive.
    async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimeEntry>, SyncError>;

    /// The one entry whose id matches exactly.
    async fn fetch_entry(&self, id: i64) -> Result<TimeEntry, SyncError>;
}

/// Entry source backed by the `t` executable (timetrap).
pub struct TimetrapClient {
    bin: String,
}

impl Default for TimetrapClient {
    fn default() -> Self {
        Self::with_bin("t")
    }
}

impl TimetrapClient {
    pub fn with_bin(bin: &str) -> Self {
        Self {
            bin: bin.to_string(),
        }
    }

    /// Runs one `t display` invocation and hands back stdout.
    async fn run_display(&self, args: &[&str]) -> Result<String, SyncError> {
        debug!("Running `{} {}`", self.bin, args.join(" "));
        let output = Command::new(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|err| SyncError::SourceUnavailable(err.to_string()))?;
        if !output.status.success() {
            return Err(SyncError::SourceUnavailable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Fetches and parses entries, retrying once with the short-flag verb
    /// when the primary invocation yields something unparseable.
    async fn fetch_parsed(&self, range: Option<(&str, &str)>) -> Result<Vec<TimeEntry>, SyncError> {
        let mut args = vec!["display", "--format", "json"];
        if let Some((start, end)) = range {
            args.extend(["--start", start, "--end", end]);
        }

        let payload = self.run_display(&args).await?;
        match parse_entries(&payload) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!("Primary timetrap invocation was unparseable, retrying with `-f json`");
                let mut alternate = vec!["display", "-f", "json"];
                if let Some((start, end)) = range {
                    alternate.extend(["--start", start, "--end", end]);
                }
                let payload = self.run_display(&alternate).await?;
                // surface the original parse error if the retry fails too
                parse_entries(&payload).map_err(|_| err)
            }
        }
    }
}

impl EntrySource for TimetrapClient {
    async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimeEntry>, SyncError> {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();

        let entries = self.fetch_parsed(Some((&start, &end))).await?;
        if entries.is_empty() {
            return Err(SyncError::EmptyResult);
        }

        Ok(entries)
    }

    async fn fetch_entry(&self, id: i64) -> Result<TimeEntry, SyncError> {
        // the display verb cannot filter by id, so select from the full set
        let entries = self.fetch_parsed(None).await?;

        entries
            .into_iter()
            .find(|entry| entry.id == Some(id))
            .ok_or(SyncError::NotFound(id))
    }
}

/// Parses a `t display` payload as an entry array.
///
/// Timetrap sometimes prefixes the JSON with sheet banners or warnings, so a
/// parse failure falls back to the outermost `[` .. `]` sub-document before
/// the payload is declared malformed.
fn parse_entries(payload: &str) -> Result<Vec<TimeEntry>, SyncError> {
    match serde_json::from_str(payload) {
        Ok(entries) => Ok(entries),
        Err(err) => {
            salvage_array(payload).ok_or_else(|| SyncError::MalformedResponse(err.to_string()))
        }
    }
}

fn salvage_array(payload: &str) -> Option<Vec<TimeEntry>> {
    let open = payload.find('[')?;
    let close = payload.rfind(']')?;
    if close <= open {
        return None;
    }

    serde_json::from_str(&payload[open..=close]).ok()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::parse_entries;
    use super::EntrySource;
    use super::TimetrapClient;
    use crate::error::SyncError;

    const CLEAN_PAYLOAD: &str = r#"[
        {"id": 1, "note": "@PROJ-1: a", "start": "2024-01-15T09:00:00Z", "end": "2024-01-15T10:00:00Z"},
        {"id": 2, "note": "@PROJ-2", "start": "2024-01-15T10:00:00Z"}
    ]"#;

    #[test]
    fn test_parse_entries_clean_payload() {
        let entries = parse_entries(CLEAN_PAYLOAD).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, Some(1));
        assert_eq!(entries[1].end, None);
    }

    /// Banner noise around the array is salvaged.
    #[test]
    fn test_parse_entries_salvages_noisy_payload() {
        let noisy = format!("Timesheet: work\n{}\nbye\n", CLEAN_PAYLOAD);

        let entries = parse_entries(&noisy).unwrap();

        assert_eq!(entries.len(), 2);
    }

    #[rstest]
    #[case::no_array_at_all("Timesheet: work")]
    #[case::broken_array("[{\"id\": oops]")]
    #[case::empty("")]
    fn test_parse_entries_malformed(#[case] payload: &str) {
        let result = parse_entries(payload);

        assert!(matches!(result, Err(SyncError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_fetch_entry_missing_binary_is_source_unavailable() {
        let client = TimetrapClient::with_bin("timetrap-binary-that-does-not-exist");

        let result = client.fetch_entry(1).await;

        assert!(matches!(result, Err(SyncError::SourceUnavailable(_))));
    }
}
