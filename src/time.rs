use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Inclusive `[start, end]` window over sample timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Parses an ISO-8601 timestamp as sent by the dashboard.
///
/// Accepts RFC 3339 (with `Z` or a numeric offset), an offset-less date-time
/// which is taken as UTC, and a bare date meaning UTC midnight. Returns `None`
/// for blank or unparsable input.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Wire format: RFC 3339, `Z` suffix, fractional seconds only when non-zero.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Serde adapter keeping timestamps as ISO-8601 strings on the wire.
pub mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(*ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid ISO-8601 timestamp: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, s)
            .single()
            .expect("utc")
    }

    #[test]
    fn parses_rfc3339_with_and_without_fraction() {
        assert_eq!(parse_timestamp("2024-01-01T01:00:00Z"), Some(utc(1, 0, 0)));
        assert_eq!(
            parse_timestamp("2024-01-01T01:00:00.000Z"),
            Some(utc(1, 0, 0))
        );
        assert_eq!(
            parse_timestamp("2024-01-01T03:00:00+02:00"),
            Some(utc(1, 0, 0))
        );
    }

    #[test]
    fn offsetless_and_date_only_inputs_are_utc() {
        assert_eq!(parse_timestamp("2024-01-01T05:30:00"), Some(utc(5, 30, 0)));
        assert_eq!(parse_timestamp(" 2024-01-01 05:30:00 "), Some(utc(5, 30, 0)));
        assert_eq!(parse_timestamp("2024-01-01"), Some(utc(0, 0, 0)));
    }

    #[test]
    fn rejects_blank_and_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01T00:00:00Z"), None);
    }

    #[test]
    fn formats_whole_seconds_without_fraction() {
        assert_eq!(format_timestamp(utc(2, 0, 0)), "2024-01-01T02:00:00Z");
        let with_millis = utc(2, 0, 0) + chrono::Duration::milliseconds(250);
        assert_eq!(format_timestamp(with_millis), "2024-01-01T02:00:00.250Z");
    }

    #[test]
    fn range_is_inclusive_on_both_bounds() {
        let range = TimeRange::new(utc(0, 0, 0), utc(1, 0, 0));
        assert!(range.contains(utc(0, 0, 0)));
        assert!(range.contains(utc(1, 0, 0)));
        assert!(!range.contains(utc(1, 0, 1)));
    }
}
