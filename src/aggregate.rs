//! Summaries over filtered rows
//!
//! Stateless group-and-count / group-and-sum functions. Only groups present
//! in the input appear in the output; nothing is zero-filled.

use crate::dataset::{EnrichedTransaction, YearMonth};
use crate::meal::Meal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Number of transactions served for one meal category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealCount {
    pub meal: Meal,
    pub total_students: usize,
}

/// Number of transactions for one sex label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenderCount {
    pub sex: String,
    pub total_students: usize,
}

/// Net charge total for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCharge {
    pub month_year: YearMonth,
    pub total_net_charge: f64,
}

pub type CategorySummary = Vec<MealCount>;
pub type GenderSummary = Vec<GenderCount>;
pub type TimeSeries = Vec<MonthlyCharge>;

/// Counts rows per meal, ordered by meal label.
///
/// Rows without a valid service time have no meal and are skipped.
pub fn aggregate_by_meal(rows: &[&EnrichedTransaction]) -> CategorySummary {
    let mut counts: BTreeMap<Meal, usize> = BTreeMap::new();
    for meal in rows.iter().filter_map(|row| row.meal()) {
        *counts.entry(meal).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(meal, total_students)| MealCount {
            meal,
            total_students,
        })
        .collect()
}

/// Counts rows per sex label, most frequent first.
///
/// Ties are ordered by label. Rows with no label are skipped. This does not
/// look at the service time.
pub fn aggregate_by_gender(rows: &[&EnrichedTransaction]) -> GenderSummary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for sex in rows.iter().filter_map(|row| row.sex.as_deref()) {
        *counts.entry(sex).or_insert(0) += 1;
    }

    let mut summary: GenderSummary = counts
        .into_iter()
        .map(|(sex, total_students)| GenderCount {
            sex: sex.to_string(),
            total_students,
        })
        .collect();
    summary.sort_by(|a, b| {
        b.total_students
            .cmp(&a.total_students)
            .then_with(|| a.sex.cmp(&b.sex))
    });
    summary
}

/// Sums net charge per calendar month, in chronological order.
pub fn aggregate_by_month(rows: &[&EnrichedTransaction]) -> TimeSeries {
    let mut totals: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for row in rows {
        if let Some(month) = row.month_year() {
            *totals.entry(month).or_insert(0.0) += row.net_charge;
        }
    }

    totals
        .into_iter()
        .map(|(month_year, total_net_charge)| MonthlyCharge {
            month_year,
            total_net_charge,
        })
        .collect()
}
