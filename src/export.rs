//! CSV export of dashboard tables.

use crate::aggregate::{GenderCount, MealCount, MonthlyCharge};
use crate::dataset::EnrichedTransaction;
use crate::meal::{weekday_full_name, Meal};
use crate::student_id::StudentId;
use chrono::Weekday;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The exportable tables of a dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTable {
    Category,
    Gender,
    TimeSeries,
    Transactions,
}

impl ExportTable {
    /// Download file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportTable::Category => "Category.csv",
            ExportTable::Gender => "Gender.csv",
            ExportTable::TimeSeries => "TimeSeries.csv",
            ExportTable::Transactions => "Transactions.csv",
        }
    }
}

impl FromStr for ExportTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "category" => Ok(ExportTable::Category),
            "gender" => Ok(ExportTable::Gender),
            "timeseries" => Ok(ExportTable::TimeSeries),
            "transactions" => Ok(ExportTable::Transactions),
            other => Err(format!("Unknown export table: {}", other)),
        }
    }
}

/// One filtered row as written to `Transactions.csv`.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub student_id: StudentId,
    pub sex: Option<String>,
    pub service_time: Option<String>,
    pub net_charge: f64,
    #[serde(with = "weekday_full_name")]
    pub weekday: Option<Weekday>,
    pub meal: Option<Meal>,
}

impl From<&EnrichedTransaction> for TransactionRecord {
    fn from(row: &EnrichedTransaction) -> Self {
        TransactionRecord {
            student_id: row.student_id.clone(),
            sex: row.sex.clone(),
            service_time: row
                .timestamp()
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            net_charge: row.net_charge,
            weekday: row.weekday(),
            meal: row.meal(),
        }
    }
}

/// Error while writing CSV.
#[derive(Debug)]
pub struct ExportError(String);

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CSV export failed: {}", self.0)
    }
}

impl std::error::Error for ExportError {}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError(err.to_string())
    }
}

/// A row type with a fixed CSV header.
///
/// `HEADERS` must list the serialized field names in declaration order.
pub trait CsvRecord: Serialize {
    const HEADERS: &'static [&'static str];
}

impl CsvRecord for MealCount {
    const HEADERS: &'static [&'static str] = &["meal", "total_students"];
}

impl CsvRecord for GenderCount {
    const HEADERS: &'static [&'static str] = &["sex", "total_students"];
}

impl CsvRecord for MonthlyCharge {
    const HEADERS: &'static [&'static str] = &["month_year", "total_net_charge"];
}

impl CsvRecord for TransactionRecord {
    const HEADERS: &'static [&'static str] =
        &["student_id", "sex", "service_time", "net_charge", "weekday", "meal"];
}

/// Serializes records as UTF-8 CSV with a header row.
///
/// The header is written even when there are no records.
pub fn to_csv<T: CsvRecord>(records: &[T]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(T::HEADERS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.into_inner()
        .map_err(|e| ExportError(e.error().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_by_gender, aggregate_by_meal, aggregate_by_month};
    use crate::dataset::enrich;
    use crate::filter::all_rows;
    use crate::transaction::Transaction;

    fn rows() -> Vec<EnrichedTransaction> {
        enrich(vec![
            Transaction::new(
                StudentId::new("s1").unwrap(),
                Some("M".to_string()),
                Some("2024-01-15T07:30:00".to_string()),
                50.0,
            ),
            Transaction::new(
                StudentId::new("s2").unwrap(),
                Some("F".to_string()),
                Some("2024-01-15T12:00:00".to_string()),
                30.5,
            ),
        ])
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_category_csv() {
        let rows = rows();
        let csv = text(to_csv(&aggregate_by_meal(&all_rows(&rows))).unwrap());
        assert_eq!(csv, "meal,total_students\nbreakfast,1\nlunch,1\n");
    }

    #[test]
    fn test_gender_csv() {
        let rows = rows();
        let csv = text(to_csv(&aggregate_by_gender(&all_rows(&rows))).unwrap());
        assert_eq!(csv, "sex,total_students\nF,1\nM,1\n");
    }

    #[test]
    fn test_time_series_csv() {
        let rows = rows();
        let csv = text(to_csv(&aggregate_by_month(&all_rows(&rows))).unwrap());
        assert_eq!(csv, "month_year,total_net_charge\n2024 : Jan,80.5\n");
    }

    #[test]
    fn test_transactions_csv() {
        let rows = rows();
        let records: Vec<TransactionRecord> = rows.iter().map(TransactionRecord::from).collect();
        let csv = text(to_csv(&records).unwrap());
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("student_id,sex,service_time,net_charge,weekday,meal")
        );
        assert_eq!(lines.next(), Some("s1,M,2024-01-15 07:30:00,50.0,Monday,breakfast"));
    }

    #[test]
    fn test_service_time_keeps_fraction() {
        let rows = enrich(vec![Transaction::new(
            StudentId::new("s1").unwrap(),
            None,
            Some("2024-01-15 08:30:00.5".to_string()),
            1.0,
        )]);
        let record = TransactionRecord::from(&rows[0]);
        assert_eq!(record.service_time.as_deref(), Some("2024-01-15 08:30:00.500"));
        assert_eq!(record.meal, Some(Meal::Dinner));
    }

    #[test]
    fn test_empty_exports_keep_headers() {
        let none: Vec<EnrichedTransaction> = Vec::new();
        let rows = all_rows(&none);

        assert_eq!(
            text(to_csv(&aggregate_by_meal(&rows)).unwrap()),
            "meal,total_students\n"
        );
        assert_eq!(
            text(to_csv(&aggregate_by_gender(&rows)).unwrap()),
            "sex,total_students\n"
        );
        assert_eq!(
            text(to_csv(&aggregate_by_month(&rows)).unwrap()),
            "month_year,total_net_charge\n"
        );
        let records: Vec<TransactionRecord> = Vec::new();
        assert_eq!(
            text(to_csv(&records).unwrap()),
            "student_id,sex,service_time,net_charge,weekday,meal\n"
        );
    }

    #[test]
    fn test_export_table_parse() {
        assert_eq!("category".parse::<ExportTable>().unwrap(), ExportTable::Category);
        assert_eq!("TimeSeries".parse::<ExportTable>().unwrap(), ExportTable::TimeSeries);
        assert_eq!(ExportTable::Gender.file_name(), "Gender.csv");
        assert!("pie".parse::<ExportTable>().is_err());
    }
}
