//! Date-window policy for sync runs.
//!
//! The POS API takes `fromDate`/`toDate` query parameters in day/month/year
//! form. Manual runs supply the window explicitly; scheduled runs use a
//! rolling `[now - lookback, now]` window wide enough to cover missed cron
//! ticks. The window is never derived from checkpoints.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// How this run's window was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Rolling lookback window; used by the cron trigger.
    Auto,
    /// Explicit operator-supplied window; used for backfills.
    Manual,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::Auto => write!(f, "auto"),
            SyncMode::Manual => write!(f, "manual"),
        }
    }
}

impl SyncMode {
    /// The `run_type` value stored in the run log.
    #[must_use]
    pub fn run_type(&self) -> &'static str {
        match self {
            SyncMode::Auto => "scheduled",
            SyncMode::Manual => "manual",
        }
    }
}

/// An inclusive fetch window in the POS's `dd/mm/yyyy` wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    pub from_date: String,
    pub to_date: String,
}

impl DateWindow {
    /// Rolling window ending at `now`, starting `lookback_hours` earlier.
    #[must_use]
    pub fn lookback_from(now: DateTime<Utc>, lookback_hours: i64) -> Self {
        let start = now - Duration::hours(lookback_hours);
        Self {
            from_date: format_date(start.date_naive()),
            to_date: format_date(now.date_naive()),
        }
    }
}

/// Format a date in the POS wire form (`dd/mm/yyyy`).
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `dd/mm/yyyy` string, rejecting anything else.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Decide the mode and window for a run.
///
/// A run is scheduled (`Auto`) when the caller asks for it explicitly with
/// `mode = "auto"`, or whenever either date is missing or not a valid
/// `dd/mm/yyyy` value. Only a fully valid explicit range selects `Manual`.
#[must_use]
pub fn resolve_window(
    mode: Option<&str>,
    from_date: Option<&str>,
    to_date: Option<&str>,
    lookback_hours: i64,
    now: DateTime<Utc>,
) -> (SyncMode, DateWindow) {
    let explicit = match (from_date, to_date) {
        (Some(from), Some(to)) => {
            (parse_date(from).is_some() && parse_date(to).is_some()).then(|| DateWindow {
                from_date: from.to_string(),
                to_date: to.to_string(),
            })
        }
        _ => None,
    };

    match explicit {
        Some(window) if mode != Some("auto") => (SyncMode::Manual, window),
        _ => (
            SyncMode::Auto,
            DateWindow::lookback_from(now, lookback_hours),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 30, 0).unwrap()
    }

    #[test]
    fn format_date_pads_day_and_month() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(format_date(date), "02/01/2025");
    }

    #[test]
    fn parse_date_round_trips() {
        let date = parse_date("31/12/2024").expect("should parse");
        assert_eq!(format_date(date), "31/12/2024");
    }

    #[test]
    fn parse_date_rejects_iso_form() {
        assert!(parse_date("2024-12-31").is_none());
    }

    #[test]
    fn parse_date_rejects_impossible_day() {
        assert!(parse_date("32/01/2025").is_none());
    }

    #[test]
    fn lookback_window_spans_previous_day() {
        let window = DateWindow::lookback_from(at(2025, 3, 10, 6), 24);
        assert_eq!(window.from_date, "09/03/2025");
        assert_eq!(window.to_date, "10/03/2025");
    }

    #[test]
    fn lookback_window_crosses_month_boundary() {
        let window = DateWindow::lookback_from(at(2025, 3, 1, 1), 24);
        assert_eq!(window.from_date, "28/02/2025");
        assert_eq!(window.to_date, "01/03/2025");
    }

    #[test]
    fn resolve_explicit_range_is_manual() {
        let (mode, window) = resolve_window(
            None,
            Some("01/01/2025"),
            Some("02/01/2025"),
            24,
            at(2025, 3, 10, 6),
        );
        assert_eq!(mode, SyncMode::Manual);
        assert_eq!(window.from_date, "01/01/2025");
        assert_eq!(window.to_date, "02/01/2025");
    }

    #[test]
    fn resolve_mode_auto_overrides_explicit_dates() {
        let (mode, window) = resolve_window(
            Some("auto"),
            Some("01/01/2025"),
            Some("02/01/2025"),
            24,
            at(2025, 3, 10, 6),
        );
        assert_eq!(mode, SyncMode::Auto);
        assert_eq!(window.to_date, "10/03/2025");
    }

    #[test]
    fn resolve_missing_to_date_falls_back_to_auto() {
        let (mode, _) = resolve_window(None, Some("01/01/2025"), None, 24, at(2025, 3, 10, 6));
        assert_eq!(mode, SyncMode::Auto);
    }

    #[test]
    fn resolve_unparseable_dates_fall_back_to_auto() {
        let (mode, window) = resolve_window(
            None,
            Some("yesterday"),
            Some("today"),
            24,
            at(2025, 3, 10, 6),
        );
        assert_eq!(mode, SyncMode::Auto);
        assert_eq!(window.from_date, "09/03/2025");
    }

    #[test]
    fn run_type_labels() {
        assert_eq!(SyncMode::Auto.run_type(), "scheduled");
        assert_eq!(SyncMode::Manual.run_type(), "manual");
    }
}
