//! Cleaning and query pipeline over the raw sheet rows.
//!
//! Every stage is a pure function: raw rows go in, a new [`Table`] comes out,
//! and nothing is mutated in place. Rows that fail to parse are flagged and
//! dropped, never surfaced downstream — the drop counts end up in a
//! [`CleanReport`] so a refresh can say how much of the sheet was unusable.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::models::{RawRow, Reading, Table};

// ---

/// Why a raw row was rejected during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowIssue {
    /// Store label missing or blank.
    MissingStore,
    /// Date or time absent, or neither spelling parsed.
    BadTimestamp,
    /// Temperature or humidity missing, non-numeric, or non-finite.
    BadMetric,
}

/// Per-fetch tally of rows read and rows dropped by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub missing_store: usize,
    pub bad_timestamp: usize,
    pub bad_metric: usize,
}

impl CleanReport {
    pub fn rows_dropped(&self) -> usize {
        self.missing_store + self.bad_timestamp + self.bad_metric
    }
}

// ---

// Date spellings the sheet has been seen to contain. pandas parsed these
// leniently in the old dashboard; we accept the same handful explicitly.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // ---
    let raw = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }

    // Some exports deliver a full datetime in the Date column; keep the
    // date part and let the Time column supply the time-of-day.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    // ---
    let raw = raw.trim();
    for fmt in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(raw, fmt) {
            return Some(time);
        }
    }
    None
}

/// Combine a row's Date and Time fields into one comparable timestamp.
///
/// Never panics: any missing or unparseable field is a [`RowIssue`] that the
/// caller turns into a dropped row.
pub fn normalize_timestamp(
    date: Option<&str>,
    time: Option<&str>,
) -> Result<NaiveDateTime, RowIssue> {
    // ---
    let date = date.and_then(parse_date).ok_or(RowIssue::BadTimestamp)?;
    let time = time.and_then(parse_time).ok_or(RowIssue::BadTimestamp)?;
    Ok(date.and_time(time))
}

/// Parse a metric cell as a decimal number.
///
/// Rejects missing, non-numeric, and non-finite values; "NaN" in the sheet
/// must become a dropped row, not a NaN that sails through classification.
pub fn coerce_metric(raw: Option<&str>) -> Result<f64, RowIssue> {
    // ---
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or(RowIssue::BadMetric)
}

// ---

/// Clean a raw snapshot: normalize timestamps, coerce metrics, drop the rest.
///
/// Output order is source row order. Total over its input: bad rows are
/// counted, never propagated as errors.
pub fn clean(rows: &[RawRow]) -> (Table, CleanReport) {
    // ---
    let mut table = Table::with_capacity(rows.len());
    let mut report = CleanReport {
        rows_read: rows.len(),
        ..CleanReport::default()
    };

    for row in rows {
        match clean_row(row) {
            Ok(reading) => table.push(reading),
            Err(RowIssue::MissingStore) => report.missing_store += 1,
            Err(RowIssue::BadTimestamp) => report.bad_timestamp += 1,
            Err(RowIssue::BadMetric) => report.bad_metric += 1,
        }
    }

    report.rows_kept = table.len();
    (table, report)
}

fn clean_row(row: &RawRow) -> Result<Reading, RowIssue> {
    // ---
    let store = row
        .store
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(RowIssue::MissingStore)?;

    let timestamp = normalize_timestamp(row.date.as_deref(), row.time.as_deref())?;
    let temperature = coerce_metric(row.temperature.as_deref())?;
    let humidity = coerce_metric(row.humidity.as_deref())?;

    Ok(Reading {
        store: store.to_string(),
        timestamp,
        temperature,
        humidity,
    })
}

// ---

/// Stable ascending sort by timestamp; equal timestamps keep source order.
pub fn sort_by_time(table: &[Reading]) -> Table {
    // ---
    let mut sorted = table.to_vec();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    sorted
}

/// The reading with the greatest timestamp for `store`, or `None` if the
/// store has no rows at all.
///
/// Ties on the timestamp go to the row appearing later in the table, so on a
/// time-sorted table this is always the last matching row.
pub fn latest_for<'a>(table: &'a [Reading], store: &str) -> Option<&'a Reading> {
    // ---
    table
        .iter()
        .filter(|r| r.store == store)
        .fold(None, |best: Option<&Reading>, r| match best {
            Some(b) if b.timestamp > r.timestamp => Some(b),
            _ => Some(r),
        })
}

/// Rows whose calendar date falls in `[start, end]`, both ends inclusive.
pub fn window_filter(table: &[Reading], start: NaiveDate, end: NaiveDate) -> Table {
    // ---
    table
        .iter()
        .filter(|r| {
            let date = r.timestamp.date();
            date >= start && date <= end
        })
        .cloned()
        .collect()
}

/// Rows from the last 24 hours relative to `now`.
pub fn last_24_hours(table: &[Reading], now: NaiveDateTime) -> Table {
    // ---
    let cutoff = now - Duration::hours(24);
    table
        .iter()
        .filter(|r| r.timestamp >= cutoff)
        .cloned()
        .collect()
}

/// Rows belonging to any of the given stores.
pub fn filter_stores(table: &[Reading], stores: &[String]) -> Table {
    // ---
    table
        .iter()
        .filter(|r| stores.iter().any(|s| *s == r.store))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    fn raw(
        store: &str,
        date: &str,
        time: &str,
        temperature: &str,
        humidity: &str,
    ) -> RawRow {
        // ---
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        RawRow {
            store: opt(store),
            date: opt(date),
            time: opt(time),
            temperature: opt(temperature),
            humidity: opt(humidity),
        }
    }

    fn ts(date: &str, time: &str) -> NaiveDateTime {
        // ---
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_clean_keeps_valid_rows() {
        // ---
        let rows = vec![raw("Store 1", "2025-06-01", "08:30:00", "21.5", "60")];
        let (table, report) = clean(&rows);

        assert_eq!(table.len(), 1);
        assert_eq!(table[0].store, "Store 1");
        assert_eq!(table[0].timestamp, ts("2025-06-01", "08:30:00"));
        assert_eq!(table[0].temperature, 21.5);
        assert_eq!(table[0].humidity, 60.0);
        assert_eq!(report.rows_kept, 1);
        assert_eq!(report.rows_dropped(), 0);
    }

    #[test]
    fn test_clean_drops_invalid_rows() {
        // ---
        let rows = vec![
            raw("Store 1", "2025-06-01", "08:30:00", "21.5", "60"),
            raw("", "2025-06-01", "08:30:00", "21.5", "60"), // no store
            raw("Store 2", "not a date", "08:30:00", "21.5", "60"), // bad date
            raw("Store 2", "2025-06-01", "late", "21.5", "60"), // bad time
            raw("Store 3", "2025-06-01", "08:30:00", "warm", "60"), // bad temp
            raw("Store 3", "2025-06-01", "08:30:00", "21.5", ""), // missing humidity
            raw("Store 3", "2025-06-01", "08:30:00", "NaN", "60"), // NaN leak attempt
        ];
        let (table, report) = clean(&rows);

        assert_eq!(table.len(), 1);
        assert_eq!(report.rows_read, 7);
        assert_eq!(report.missing_store, 1);
        assert_eq!(report.bad_timestamp, 2);
        assert_eq!(report.bad_metric, 3);
        assert_eq!(report.rows_dropped(), 6);
    }

    #[test]
    fn test_timestamp_spellings() {
        // ---
        let expected = ts("2025-06-01", "14:05:00");
        assert_eq!(
            normalize_timestamp(Some("2025/06/01"), Some("14:05")),
            Ok(expected)
        );
        assert_eq!(
            normalize_timestamp(Some("01/06/2025"), Some("02:05:00 PM")),
            Ok(expected)
        );
        assert_eq!(
            normalize_timestamp(Some("2025-06-01 00:00:00"), Some("14:05:00")),
            Ok(expected)
        );
        assert_eq!(
            normalize_timestamp(None, Some("14:05:00")),
            Err(RowIssue::BadTimestamp)
        );
    }

    #[test]
    fn test_sort_by_time_is_stable_and_idempotent() {
        // ---
        let rows = vec![
            raw("Store 2", "2025-06-01", "10:00:00", "20", "60"),
            raw("Store 1", "2025-06-01", "09:00:00", "20", "60"),
            raw("Store 3", "2025-06-01", "10:00:00", "20", "60"),
        ];
        let (table, _) = clean(&rows);

        let sorted = sort_by_time(&table);
        assert_eq!(sorted[0].store, "Store 1");
        // Equal timestamps keep source order: Store 2 before Store 3
        assert_eq!(sorted[1].store, "Store 2");
        assert_eq!(sorted[2].store, "Store 3");

        // Sorting a sorted table changes nothing
        assert_eq!(sort_by_time(&sorted), sorted);
    }

    #[test]
    fn test_latest_for_max_timestamp() {
        // ---
        let rows = vec![
            raw("Store 1", "2025-06-01", "09:00:00", "20", "60"),
            raw("Store 1", "2025-06-02", "09:00:00", "22", "62"),
            raw("Store 2", "2025-06-03", "09:00:00", "19", "58"),
        ];
        let (table, _) = clean(&rows);

        let latest = latest_for(&table, "Store 1").unwrap();
        assert_eq!(latest.timestamp, ts("2025-06-02", "09:00:00"));
        assert_eq!(latest.temperature, 22.0);
    }

    #[test]
    fn test_latest_for_tie_prefers_later_row() {
        // ---
        let rows = vec![
            raw("Store 1", "2025-06-01", "09:00:00", "20", "60"),
            raw("Store 1", "2025-06-01", "09:00:00", "24", "70"),
        ];
        let (table, _) = clean(&rows);

        let latest = latest_for(&table, "Store 1").unwrap();
        assert_eq!(latest.temperature, 24.0);
    }

    #[test]
    fn test_latest_for_no_data() {
        // ---
        let rows = vec![raw("Store 1", "2025-06-01", "09:00:00", "20", "60")];
        let (table, _) = clean(&rows);
        assert!(latest_for(&table, "Store 7").is_none());
    }

    #[test]
    fn test_window_filter_inclusive() {
        // ---
        let rows = vec![
            raw("Store 1", "2025-06-01", "09:00:00", "20", "60"),
            raw("Store 1", "2025-06-02", "09:00:00", "20", "60"),
            raw("Store 1", "2025-06-03", "09:00:00", "20", "60"),
            raw("Store 1", "2025-06-04", "09:00:00", "20", "60"),
        ];
        let (table, _) = clean(&rows);

        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let windowed = window_filter(&table, start, end);

        assert_eq!(windowed.len(), 2);
        assert!(windowed.iter().all(|r| {
            let d = r.timestamp.date();
            d >= start && d <= end
        }));
        // Original untouched
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_last_24_hours_boundary() {
        // ---
        let rows = vec![
            raw("Store 1", "2025-06-01", "12:00:00", "20", "60"), // exactly 24h ago
            raw("Store 1", "2025-06-01", "11:59:59", "20", "60"), // just over
            raw("Store 1", "2025-06-02", "08:00:00", "20", "60"), // within
        ];
        let (table, _) = clean(&rows);

        let now = ts("2025-06-02", "12:00:00");
        let recent = last_24_hours(&table, now);

        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|r| r.timestamp >= now - Duration::hours(24)));
    }

    #[test]
    fn test_filter_stores() {
        // ---
        let rows = vec![
            raw("Store 1", "2025-06-01", "09:00:00", "20", "60"),
            raw("Store 2", "2025-06-01", "09:00:00", "20", "60"),
            raw("Store 3", "2025-06-01", "09:00:00", "20", "60"),
        ];
        let (table, _) = clean(&rows);

        let wanted = vec!["Store 1".to_string(), "Store 3".to_string()];
        let filtered = filter_stores(&table, &wanted);

        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| wanted.contains(&r.store)));
    }
}
