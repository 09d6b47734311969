//! Dashboard Pipeline
//!
//! Runs the full filter-and-summarize pass over a snapshot for one set of
//! user parameters. Every call recomputes from the snapshot; nothing is
//! cached between calls.

use crate::aggregate::{
    aggregate_by_gender, aggregate_by_meal, aggregate_by_month, CategorySummary, GenderSummary,
    TimeSeries,
};
use crate::dataset::Dataset;
use crate::filter::{all_rows, filter_by_date_range, filter_by_set, non_empty, RowSet, Selection, TimeRange};
use crate::meal::{weekday_name, Meal, WEEKDAYS};
use crate::student_id::StudentId;
use chrono::{NaiveDateTime, Weekday};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// User-supplied filter parameters.
///
/// `None` bounds default to the dataset's earliest/latest service time;
/// `None` selections place no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardParams {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub students: Option<HashSet<StudentId>>,
    pub meals: Option<HashSet<Meal>>,
    pub weekdays: Option<HashSet<Weekday>>,
}

impl DashboardParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_students(mut self, students: impl IntoIterator<Item = StudentId>) -> Self {
        self.students = non_empty(students.into_iter().collect());
        self
    }

    pub fn with_meals(mut self, meals: impl IntoIterator<Item = Meal>) -> Self {
        self.meals = non_empty(meals.into_iter().collect());
        self
    }

    pub fn with_weekdays(mut self, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        self.weekdays = non_empty(weekdays.into_iter().collect());
        self
    }

    /// The date range to apply, filling unset bounds from the dataset.
    ///
    /// `None` when a bound is unset and the dataset has no valid service
    /// time to default it from.
    pub fn effective_range(&self, dataset: &Dataset) -> Option<TimeRange> {
        let bounds = dataset.time_bounds();
        let start = self.start.or(bounds.map(|(lo, _)| lo))?;
        let end = self.end.or(bounds.map(|(_, hi)| hi))?;
        Some(TimeRange::new(start, end))
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    /// Date range actually applied
    pub range: Option<TimeRange>,
    /// Rows left after the date filter alone
    pub date_filtered_count: usize,
    /// Rows left after every filter
    pub rows: RowSet<'a>,
    pub category: CategorySummary,
    pub gender: GenderSummary,
    pub time_series: TimeSeries,
}

fn date_filtered<'a>(dataset: &'a Dataset, params: &DashboardParams) -> RowSet<'a> {
    match params.effective_range(dataset) {
        Some(range) => filter_by_date_range(&all_rows(dataset.rows()), &range),
        None => Vec::new(),
    }
}

/// Applies the date range then the student, meal and weekday selections and
/// summarizes what is left.
///
/// The date range is always applied (defaulting to the dataset bounds), so
/// rows with an invalid service time never reach any summary.
pub fn run<'a>(dataset: &'a Dataset, params: &DashboardParams) -> DashboardView<'a> {
    let range = params.effective_range(dataset);
    let by_date = date_filtered(dataset, params);
    let date_filtered_count = by_date.len();

    let rows = [
        Selection::Students(params.students.clone()),
        Selection::Meals(params.meals.clone()),
        Selection::Weekdays(params.weekdays.clone()),
    ]
    .iter()
    .fold(by_date, |rows, selection| filter_by_set(&rows, selection));

    tracing::debug!(
        date_filtered = date_filtered_count,
        remaining = rows.len(),
        "dashboard filters applied"
    );

    DashboardView {
        range,
        date_filtered_count,
        category: aggregate_by_meal(&rows),
        gender: aggregate_by_gender(&rows),
        time_series: aggregate_by_month(&rows),
        rows,
    }
}

/// Choices offered for each filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Earliest valid service time in the dataset
    pub min_service_time: Option<NaiveDateTime>,
    /// Latest valid service time in the dataset
    pub max_service_time: Option<NaiveDateTime>,
    /// Students present in the date range
    pub students: Vec<StudentId>,
    /// Meals present in the date range for the selected students
    pub meals: Vec<Meal>,
    /// All seven weekday names
    pub weekdays: Vec<&'static str>,
}

/// Sidebar choices for the current date range and student selection.
pub fn filter_options(dataset: &Dataset, params: &DashboardParams) -> FilterOptions {
    let by_date = date_filtered(dataset, params);

    let students: BTreeSet<StudentId> = by_date.iter().map(|r| r.student_id.clone()).collect();
    let for_students = filter_by_set(&by_date, &Selection::Students(params.students.clone()));
    let meals: BTreeSet<Meal> = for_students.iter().filter_map(|r| r.meal()).collect();

    let bounds = dataset.time_bounds();
    FilterOptions {
        min_service_time: bounds.map(|(lo, _)| lo),
        max_service_time: bounds.map(|(_, hi)| hi),
        students: students.into_iter().collect(),
        meals: meals.into_iter().collect(),
        weekdays: WEEKDAYS.iter().map(|d| weekday_name(*d)).collect(),
    }
}
