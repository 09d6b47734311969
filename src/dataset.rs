//! Enriched Transaction Snapshot
//!
//! Turns raw transaction rows into an immutable snapshot in which every row
//! with a parseable service time carries its weekday, meal category and
//! month. Rows whose service time cannot be parsed stay in the snapshot
//! with no calendar fields, and every time-based filter and aggregate
//! skips them.

use crate::meal::Meal;
use crate::student_id::StudentId;
use crate::transaction::{ServiceTime, SourceError, Transaction, TransactionSource};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Serialize, Serializer};
use std::fmt;

/// Calendar month of a service time, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        YearMonth { year, month }
    }

    pub fn of(timestamp: &NaiveDateTime) -> Self {
        YearMonth {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }
}

/// Formats as `"YYYY : Mon"`, e.g. `"2024 : Jan"`.
impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => write!(f, "{}", first.format("%Y : %b")),
            None => write!(f, "{:04} : {:02}", self.year, self.month),
        }
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Fields derived from a valid service time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub timestamp: NaiveDateTime,
    pub weekday: Weekday,
    pub meal: Meal,
    pub month_year: YearMonth,
}

impl CalendarFields {
    pub fn derive(timestamp: NaiveDateTime) -> Self {
        CalendarFields {
            timestamp,
            weekday: timestamp.weekday(),
            meal: Meal::from_time(timestamp.time()),
            month_year: YearMonth::of(&timestamp),
        }
    }
}

/// A transaction annotated with its derived calendar fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTransaction {
    pub student_id: StudentId,
    pub sex: Option<String>,
    pub service_time: ServiceTime,
    pub net_charge: f64,
    /// `None` when `service_time` is invalid
    pub calendar: Option<CalendarFields>,
}

impl EnrichedTransaction {
    pub fn from_transaction(row: Transaction) -> Self {
        let service_time = ServiceTime::parse(row.service_time.as_deref());
        let calendar = service_time.valid().map(CalendarFields::derive);
        EnrichedTransaction {
            student_id: row.student_id,
            sex: row.sex,
            service_time,
            net_charge: row.net_charge,
            calendar,
        }
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.calendar.map(|c| c.timestamp)
    }

    pub fn weekday(&self) -> Option<Weekday> {
        self.calendar.map(|c| c.weekday)
    }

    pub fn meal(&self) -> Option<Meal> {
        self.calendar.map(|c| c.meal)
    }

    pub fn month_year(&self) -> Option<YearMonth> {
        self.calendar.map(|c| c.month_year)
    }
}

/// Annotates every row; never fails and never drops a row.
pub fn enrich(rows: Vec<Transaction>) -> Vec<EnrichedTransaction> {
    rows.into_iter()
        .map(EnrichedTransaction::from_transaction)
        .collect()
}

/// Immutable snapshot of the enriched transaction table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<EnrichedTransaction>,
    bounds: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl Dataset {
    pub fn from_transactions(rows: Vec<Transaction>) -> Self {
        let rows = enrich(rows);
        let bounds = rows
            .iter()
            .filter_map(EnrichedTransaction::timestamp)
            .fold(None, |acc: Option<(NaiveDateTime, NaiveDateTime)>, ts| match acc {
                None => Some((ts, ts)),
                Some((lo, hi)) => Some((lo.min(ts), hi.max(ts))),
            });

        let invalid = rows.iter().filter(|r| r.calendar.is_none()).count();
        if invalid > 0 {
            log::warn!(
                "{} of {} transactions have an unparseable service_time",
                invalid,
                rows.len()
            );
        }

        Dataset { rows, bounds }
    }

    /// Reads the whole table from `source` and enriches it.
    ///
    /// # Errors
    /// Returns the source's error if the load fails.
    pub fn load(source: &dyn TransactionSource) -> Result<Self, SourceError> {
        let rows = source.load_transactions()?;
        log::info!("Loaded {} transactions", rows.len());
        Ok(Self::from_transactions(rows))
    }

    pub fn rows(&self) -> &[EnrichedTransaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn invalid_count(&self) -> usize {
        self.rows.iter().filter(|r| r.calendar.is_none()).count()
    }

    /// Earliest and latest valid service time, if any row has one.
    pub fn time_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(id: &str, sex: &str, time: &str, charge: f64) -> Transaction {
        Transaction::new(
            StudentId::new(id).unwrap(),
            Some(sex.to_string()),
            Some(time.to_string()),
            charge,
        )
    }

    #[test]
    fn test_enrich_derives_calendar_fields() {
        let rows = enrich(vec![tx("s1", "M", "2024-01-15T07:30:00", 50.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].weekday(), Some(Weekday::Mon));
        assert_eq!(rows[0].meal(), Some(Meal::Breakfast));
        assert_eq!(rows[0].month_year(), Some(YearMonth::new(2024, 1)));
    }

    #[test]
    fn test_enrich_keeps_invalid_rows_without_fields() {
        let rows = enrich(vec![
            tx("s1", "M", "not a time", 10.0),
            tx("s2", "F", "2024-02-01 20:00:00", 20.0),
        ]);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].calendar.is_none());
        assert_eq!(rows[0].meal(), None);
        assert_eq!(rows[0].weekday(), None);
        assert_eq!(rows[1].meal(), Some(Meal::Dinner));
    }

    #[test]
    fn test_dataset_time_bounds_ignore_invalid_rows() {
        let dataset = Dataset::from_transactions(vec![
            tx("s1", "M", "2024-01-15T07:30:00", 50.0),
            tx("s2", "F", "garbage", 30.0),
            tx("s1", "M", "2024-02-01T20:00:00", 20.0),
        ]);
        let (lo, hi) = dataset.time_bounds().unwrap();
        assert_eq!(
            lo,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(7, 30, 0).unwrap()
        );
        assert_eq!(
            hi,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(20, 0, 0).unwrap()
        );
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.invalid_count(), 1);
    }

    #[test]
    fn test_dataset_without_valid_times_has_no_bounds() {
        let dataset = Dataset::from_transactions(vec![tx("s1", "M", "??", 1.0)]);
        assert!(dataset.time_bounds().is_none());
        assert!(Dataset::default().time_bounds().is_none());
    }

    #[test]
    fn test_year_month_label_and_order() {
        assert_eq!(YearMonth::new(2024, 1).to_string(), "2024 : Jan");
        assert_eq!(YearMonth::new(2023, 12).to_string(), "2023 : Dec");
        assert!(YearMonth::new(2023, 12) < YearMonth::new(2024, 1));
        assert!(YearMonth::new(2024, 2) < YearMonth::new(2024, 4));
        assert_eq!(
            serde_json::to_string(&YearMonth::new(2024, 2)).unwrap(),
            "\"2024 : Feb\""
        );
    }
}
