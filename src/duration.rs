/// Converts a span in seconds into JIRA worklog notation, e.g. `"1h 30m"`.
///
/// Zero terms are omitted and whole minutes are truncated, not rounded.
/// Anything under one minute floors to `"1m"` so the worklog is never empty.
pub fn format_jira_duration(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if parts.is_empty() {
        return "1m".to_string();
    }

    parts.join(" ")
}
