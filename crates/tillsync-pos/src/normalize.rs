//! Timestamp normalization from POS reporting time to local time.
//!
//! The POS reports timestamps in UTC; the stores operate at UTC-3 and the
//! region does not observe daylight saving, so a fixed shift is correct.
//! Porting to a DST region would require a proper tz-database conversion.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Hours to subtract when converting POS-reported UTC into local time.
pub const LOCAL_OFFSET_HOURS: i64 = 3;

const BARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Shift a POS timestamp string three hours earlier and reformat it as a
/// zone-less local-time string (`YYYY-MM-DDTHH:MM:SS`).
///
/// Accepts RFC 3339 or bare date-time forms; bare values are taken as UTC.
/// Anything unparseable passes through unchanged — the caller persists the
/// original string rather than losing the record.
#[must_use]
pub fn to_local_time(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(utc) => {
            let local = utc - Duration::hours(LOCAL_OFFSET_HOURS);
            local.format("%Y-%m-%dT%H:%M:%S").to_string()
        }
        None => raw.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in BARE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_utc_is_shifted_three_hours_back() {
        assert_eq!(
            to_local_time("2025-01-15T14:30:00Z"),
            "2025-01-15T11:30:00"
        );
    }

    #[test]
    fn shift_crosses_midnight() {
        assert_eq!(
            to_local_time("2025-01-15T01:10:05Z"),
            "2025-01-14T22:10:05"
        );
    }

    #[test]
    fn shift_crosses_year_boundary() {
        assert_eq!(
            to_local_time("2025-01-01T02:00:00Z"),
            "2024-12-31T23:00:00"
        );
    }

    #[test]
    fn bare_datetime_is_treated_as_utc() {
        assert_eq!(
            to_local_time("2025-06-10 12:00:00"),
            "2025-06-10T09:00:00"
        );
    }

    #[test]
    fn offset_input_is_converted_through_utc() {
        // 14:30 at -03:00 is 17:30 UTC; local output is 14:30 again.
        assert_eq!(
            to_local_time("2025-01-15T14:30:00-03:00"),
            "2025-01-15T14:30:00"
        );
    }

    #[test]
    fn fractional_seconds_are_accepted_and_truncated() {
        assert_eq!(
            to_local_time("2025-01-15T14:30:00.250Z"),
            "2025-01-15T11:30:00"
        );
    }

    #[test]
    fn unparseable_input_passes_through_unchanged() {
        assert_eq!(to_local_time("mediodía"), "mediodía");
        assert_eq!(to_local_time(""), "");
        assert_eq!(to_local_time("15/01/2025"), "15/01/2025");
    }
}
