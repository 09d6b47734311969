use crate::student_id::StudentId;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One row of the cafeteria transaction table, as read from the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Student the meal was served to
    pub student_id: StudentId,
    /// Categorical sex label; `None` when the column is NULL
    pub sex: Option<String>,
    /// Raw service timestamp text; `None` when the column is NULL
    pub service_time: Option<String>,
    /// Amount charged for the meal
    pub net_charge: f64,
}

impl Transaction {
    /// Creates a new Transaction.
    pub fn new(
        student_id: StudentId,
        sex: Option<String>,
        service_time: Option<String>,
        net_charge: f64,
    ) -> Self {
        Transaction {
            student_id,
            sex,
            service_time,
            net_charge,
        }
    }
}

/// Parsed service timestamp.
///
/// Unparseable or missing timestamps are kept as `Invalid` rather than
/// defaulted, so the row survives but takes no part in anything time based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceTime {
    Valid(NaiveDateTime),
    Invalid(Option<String>),
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

impl ServiceTime {
    /// Parses raw timestamp text.
    ///
    /// Accepts RFC 3339 (the offset is dropped and the wall-clock time kept),
    /// `YYYY-MM-DD[ T]HH:MM[:SS[.fff]]`, and a bare `YYYY-MM-DD` meaning
    /// midnight. No timezone conversion is ever applied.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return ServiceTime::Invalid(raw.map(str::to_string));
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return ServiceTime::Valid(dt.naive_local());
        }

        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return ServiceTime::Valid(dt);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return ServiceTime::Valid(date.and_time(chrono::NaiveTime::MIN));
        }

        ServiceTime::Invalid(Some(text.to_string()))
    }

    pub fn valid(&self) -> Option<NaiveDateTime> {
        match self {
            ServiceTime::Valid(dt) => Some(*dt),
            ServiceTime::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ServiceTime::Valid(_))
    }
}

/// Trait for the upstream table of transactions.
///
/// The whole table is read in one call; there is no pagination or
/// incremental fetch. Implementations:
/// - SQLite database (`SqliteTransactionSource`)
/// - In-memory vector (for testing)
pub trait TransactionSource {
    /// Reads every transaction row.
    ///
    /// # Errors
    /// Returns an error if the source cannot be reached or the table is
    /// missing. Malformed individual rows are not errors.
    fn load_transactions(&self) -> Result<Vec<Transaction>, SourceError>;
}

/// Errors that can occur when loading transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The database could not be opened
    Open(String),
    /// The configured table does not exist
    TableNotFound(String),
    /// The table name is not a plain identifier
    InvalidTableName(String),
    /// The query failed
    Query(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Open(msg) => write!(f, "Cannot open data source: {}", msg),
            SourceError::TableNotFound(table) => write!(f, "Table '{}' not found", table),
            SourceError::InvalidTableName(table) => write!(f, "Invalid table name '{}'", table),
            SourceError::Query(msg) => write!(f, "Query failed: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// In-memory transaction source for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionSource {
    rows: Vec<Transaction>,
}

impl InMemoryTransactionSource {
    pub fn new(rows: Vec<Transaction>) -> Self {
        InMemoryTransactionSource { rows }
    }

    pub fn push(&mut self, row: Transaction) {
        self.rows.push(row);
    }
}

impl TransactionSource for InMemoryTransactionSource {
    fn load_transactions(&self) -> Result<Vec<Transaction>, SourceError> {
        Ok(self.rows.clone())
    }
}
