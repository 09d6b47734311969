//! Row filters
//!
//! Each filter is an independent predicate over borrowed rows, so any
//! application order gives the same set. A selection of `None` (or an empty
//! set) places no restriction.

use crate::dataset::EnrichedTransaction;
use crate::meal::Meal;
use crate::student_id::StudentId;
use chrono::{NaiveDateTime, Weekday};
use std::collections::HashSet;

/// Borrowed view of rows that survived filtering.
pub type RowSet<'a> = Vec<&'a EnrichedTransaction>;

/// Inclusive timestamp range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Start (inclusive)
    pub start: NaiveDateTime,
    /// End (inclusive)
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        TimeRange { start, end }
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start <= *ts && *ts <= self.end
    }
}

/// A set-membership filter on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Students(Option<HashSet<StudentId>>),
    Meals(Option<HashSet<Meal>>),
    Weekdays(Option<HashSet<Weekday>>),
}

impl Selection {
    fn is_unrestricted(&self) -> bool {
        match self {
            Selection::Students(set) => set.as_ref().map_or(true, HashSet::is_empty),
            Selection::Meals(set) => set.as_ref().map_or(true, HashSet::is_empty),
            Selection::Weekdays(set) => set.as_ref().map_or(true, HashSet::is_empty),
        }
    }

    fn matches(&self, row: &EnrichedTransaction) -> bool {
        match self {
            Selection::Students(Some(ids)) => ids.contains(&row.student_id),
            Selection::Meals(Some(meals)) => row.meal().map_or(false, |m| meals.contains(&m)),
            Selection::Weekdays(Some(days)) => row.weekday().map_or(false, |d| days.contains(&d)),
            _ => true,
        }
    }
}

/// Turns an empty selection into `None`.
pub fn non_empty<T>(set: HashSet<T>) -> Option<HashSet<T>> {
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

pub fn all_rows(rows: &[EnrichedTransaction]) -> RowSet<'_> {
    rows.iter().collect()
}

/// Keeps rows with a valid service time inside `range`.
pub fn filter_by_date_range<'a>(rows: &[&'a EnrichedTransaction], range: &TimeRange) -> RowSet<'a> {
    rows.iter()
        .copied()
        .filter(|row| row.timestamp().map_or(false, |ts| range.contains(&ts)))
        .collect()
}

/// Keeps rows whose column value is in the selection.
///
/// An unrestricted selection returns the input unchanged.
pub fn filter_by_set<'a>(rows: &[&'a EnrichedTransaction], selection: &Selection) -> RowSet<'a> {
    if selection.is_unrestricted() {
        return rows.to_vec();
    }

    rows.iter()
        .copied()
        .filter(|row| selection.matches(row))
        .collect()
}
