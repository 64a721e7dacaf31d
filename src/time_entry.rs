use anyhow::Result;
use chrono::{DateTime, Utc};
use log::warn;
use serde::Deserialize;

use crate::datetime::parse_timestamp;

/// One recorded interval as timetrap reports it.
///
/// Timestamps are kept in their raw string form; the format varies by host
/// (see [`crate::datetime::parse_timestamp`]), so parsing is deferred to the
/// accessors and a parse failure is never fatal by itself.
#[derive(Clone, Debug, Deserialize)]
pub struct TimeEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

impl TimeEntry {
    /// The note with empty and literal `"null"` values normalized away.
    pub fn note_text(&self) -> Option<&str> {
        let note = self.note.as_deref()?.trim();
        if note.is_empty() || note == "null" {
            None
        } else {
            Some(note)
        }
    }

    /// Recorded duration in seconds.
    ///
    /// Zero when the entry is still open or a timestamp does not parse;
    /// the failure is logged, not propagated.
    pub fn duration_seconds(&self) -> i64 {
        let Some(end) = self.end.as_deref() else {
            return 0;
        };
        let start = match parse_timestamp(&self.start) {
            Ok(at) => at,
            Err(err) => {
                warn!("Entry {}: unparseable start `{}`: {}", self.display_id(), self.start, err);
                return 0;
            }
        };
        let end = match parse_timestamp(end) {
            Ok(at) => at,
            Err(err) => {
                warn!("Entry {}: unparseable end `{}`: {}", self.display_id(), end, err);
                return 0;
            }
        };

        (end - start).num_seconds().max(0)
    }

    /// Start of the interval as an instant.
    pub fn started_at(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.start)
    }

    /// Identifier for log lines; entries without an id are possible.
    pub fn display_id(&self) -> String {
        self.id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<no id>".to_string())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::TimeEntry;

    fn entry(note: Option<&str>, start: &str, end: Option<&str>) -> TimeEntry {
        TimeEntry {
            id: Some(1),
            note: note.map(str::to_string),
            start: start.to_string(),
            end: end.map(str::to_string),
        }
    }

    #[rstest]
    #[case::absent(None, None)]
    #[case::empty(Some(""), None)]
    #[case::whitespace(Some("   "), None)]
    #[case::literal_null(Some("null"), None)]
    #[case::real(Some("@PROJ-123: fix"), Some("@PROJ-123: fix"))]
    fn test_note_text(#[case] note: Option<&str>, #[case] expected: Option<&str>) {
        let entry = entry(note, "2024-01-15T09:00:00Z", None);

        assert_eq!(entry.note_text(), expected);
    }

    #[rstest]
    #[case::closed(Some("2024-01-15T10:30:00Z"), 5400)]
    #[case::still_open(None, 0)]
    #[case::bad_end(Some("not a time"), 0)]
    #[case::end_before_start(Some("2024-01-15T08:00:00Z"), 0)]
    fn test_duration_seconds(#[case] end: Option<&str>, #[case] expected: i64) {
        let entry = entry(None, "2024-01-15T09:00:00Z", end);

        assert_eq!(entry.duration_seconds(), expected);
    }

    #[test]
    fn test_duration_seconds_bad_start() {
        let entry = entry(None, "not a time", Some("2024-01-15T10:00:00Z"));

        assert_eq!(entry.duration_seconds(), 0);
    }

    /// Timetrap output with missing optional fields still deserializes.
    #[test]
    fn test_deserialize_sparse_record() {
        let entry: TimeEntry =
            serde_json::from_str(r#"{"start": "2024-01-15T09:00:00Z", "sheet": "work"}"#).unwrap();

        assert_eq!(entry.id, None);
        assert_eq!(entry.note, None);
        assert_eq!(entry.end, None);
        assert_eq!(entry.display_id(), "<no id>");
    }
}
