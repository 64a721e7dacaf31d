use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

/// Offset-carrying formats accepted after RFC 3339 fails.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S %z"];

/// Offset-less formats, interpreted in the local timezone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%a %b %e %H:%M:%S %Y",
];

/// Parses a source timestamp into UTC.
///
/// Timetrap emits either `Z`-suffixed UTC or a locale-formatted variant
/// depending on which `date` tool the host carries, so the accepted formats
/// are tried in order and the first match wins.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.to_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(at) = DateTime::parse_from_str(s, format) {
            return Ok(at.to_utc());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            if let Some(local) = Local.from_local_datetime(&naive).single() {
                return Ok(local.to_utc());
            }
        }
    }

    Err(anyhow!("Unrecognized timestamp format: {}", s))
}

/// Formats a worklog start time the way the JIRA CLI expects it.
///
/// Minute precision with a literal `.000` fraction and the local offset;
/// seconds are zeroed, not rounded.
pub fn format_worklog_started(at: &DateTime<Utc>) -> String {
    format_worklog_started_in(&at.with_timezone(&Local))
}

fn format_worklog_started_in<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%dT%H:%M:00.000%z").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::rstest;

    use super::format_worklog_started_in;
    use super::parse_timestamp;

    /// Offset-carrying inputs resolve to the same UTC instant.
    #[rstest]
    #[case::rfc3339_utc("2024-01-15T09:00:30Z")]
    #[case::rfc3339_offset("2024-01-15T18:00:30+09:00")]
    #[case::compact_offset("2024-01-15T18:00:30+0900")]
    #[case::space_separated_offset("2024-01-15 18:00:30 +0900")]
    fn test_parse_timestamp_with_offset(#[case] input: &str) {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 30).unwrap();

        assert_eq!(parse_timestamp(input).unwrap(), expected);
    }

    /// Offset-less inputs are read as local time; formatting the result back
    /// in the local timezone must reproduce the wall-clock fields.
    #[rstest]
    #[case::space_separated("2024-01-15 09:00:30", "%Y-%m-%d %H:%M:%S")]
    #[case::t_separated("2024-01-15T09:00:30", "%Y-%m-%dT%H:%M:%S")]
    #[case::bsd_date("Mon Jan 15 09:00:30 2024", "%a %b %e %H:%M:%S %Y")]
    fn test_parse_timestamp_naive(#[case] input: &str, #[case] format: &str) {
        let parsed = parse_timestamp(input).unwrap();

        let roundtrip = parsed.with_timezone(&Local).format(format).to_string();
        assert_eq!(roundtrip, input);
    }

    #[rstest]
    #[case::empty("")]
    #[case::date_only("2024-01-15")]
    #[case::garbage("yesterday at nine")]
    fn test_parse_timestamp_rejects(#[case] input: &str) {
        assert!(parse_timestamp(input).is_err());
    }

    /// Seconds are zeroed and the fraction is the literal `.000`.
    #[test]
    fn test_format_worklog_started_zeroes_seconds() {
        let at = DateTime::parse_from_rfc3339("2024-01-15T09:30:45+09:00").unwrap();

        assert_eq!(
            format_worklog_started_in(&at),
            "2024-01-15T09:30:00.000+0900"
        );
    }

    /// The conversion from UTC picks up the local offset.
    #[test]
    fn test_format_worklog_started_uses_local_offset() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 45).unwrap();
        let expected = at
            .with_timezone(&Local)
            .format("%Y-%m-%dT%H:%M:00.000%z")
            .to_string();

        assert_eq!(super::format_worklog_started(&at), expected);
    }
}
