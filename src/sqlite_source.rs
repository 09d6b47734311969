use crate::student_id::StudentId;
use crate::transaction::{SourceError, Transaction, TransactionSource};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, Result as SqliteResult};
use std::path::Path;

/// Default name of the cafeteria transaction table.
pub const DEFAULT_TABLE: &str = "cafteria";

/// SQLite-backed transaction source.
///
/// Reads the whole transaction table in one query. The schema belongs to
/// whoever fills the database; `create_table` exists only for seeding demos
/// and tests.
#[derive(Debug)]
pub struct SqliteTransactionSource {
    conn: Connection,
    table: String,
}

fn validate_table_name(table: &str) -> Result<(), SourceError> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SourceError::InvalidTableName(table.to_string()))
    }
}

impl SqliteTransactionSource {
    /// Opens an existing database file.
    ///
    /// # Errors
    /// Returns `SourceError::Open` if the file does not exist or cannot be
    /// opened, and `SourceError::InvalidTableName` if `table` is not a plain
    /// identifier.
    pub fn open<P: AsRef<Path>>(db_path: P, table: impl Into<String>) -> Result<Self, SourceError> {
        let table = table.into();
        validate_table_name(&table)?;
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| SourceError::Open(e.to_string()))?;
        Ok(SqliteTransactionSource { conn, table })
    }

    /// Opens (creating if needed) a database file and ensures the table exists.
    pub fn create<P: AsRef<Path>>(db_path: P, table: impl Into<String>) -> Result<Self, SourceError> {
        let table = table.into();
        validate_table_name(&table)?;
        let conn = Connection::open(db_path).map_err(|e| SourceError::Open(e.to_string()))?;
        let source = SqliteTransactionSource { conn, table };
        source
            .create_table()
            .map_err(|e| SourceError::Query(e.to_string()))?;
        Ok(source)
    }

    /// Creates an in-memory database with no tables.
    ///
    /// Useful for testing.
    pub fn new_in_memory(table: impl Into<String>) -> Result<Self, SourceError> {
        let table = table.into();
        validate_table_name(&table)?;
        let conn = Connection::open_in_memory().map_err(|e| SourceError::Open(e.to_string()))?;
        Ok(SqliteTransactionSource { conn, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the transaction table if it doesn't exist.
    pub fn create_table(&self) -> SqliteResult<()> {
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    student_id TEXT NOT NULL,
                    sex TEXT,
                    service_time TEXT,
                    net_charge REAL
                )",
                self.table
            ),
            [],
        )?;
        Ok(())
    }

    /// Checks if a table exists in the database.
    fn table_exists(&self, table_name: &str) -> SqliteResult<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
        let exists = stmt.exists([table_name])?;
        Ok(exists)
    }

    /// Inserts transactions in a single SQLite transaction.
    pub fn insert_transactions_batch(&mut self, rows: &[Transaction]) -> SqliteResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (student_id, sex, service_time, net_charge) VALUES (?1, ?2, ?3, ?4)",
                self.table
            ))?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.student_id.as_str(),
                    row.sex,
                    row.service_time,
                    row.net_charge
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Returns a reference to the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(bytes) => String::from_utf8(bytes).ok(),
    }
}

/// NULL and non-numeric charges count as zero.
fn charge_of(value: Value) -> f64 {
    match value {
        Value::Integer(i) => i as f64,
        Value::Real(f) if f.is_finite() => f,
        Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}

impl TransactionSource for SqliteTransactionSource {
    fn load_transactions(&self) -> Result<Vec<Transaction>, SourceError> {
        let exists = self
            .table_exists(&self.table)
            .map_err(|e| SourceError::Query(e.to_string()))?;
        if !exists {
            return Err(SourceError::TableNotFound(self.table.clone()));
        }

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT student_id, sex, service_time, net_charge FROM {}",
                self.table
            ))
            .map_err(|e| SourceError::Query(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Value>(0)?,
                    row.get::<_, Value>(1)?,
                    row.get::<_, Value>(2)?,
                    row.get::<_, Value>(3)?,
                ))
            })
            .map_err(|e| SourceError::Query(e.to_string()))?;

        let mut transactions = Vec::new();
        let mut skipped = 0usize;
        for row_result in rows {
            let (student_id, sex, service_time, net_charge) =
                row_result.map_err(|e| SourceError::Query(format!("Row read error: {}", e)))?;

            let Some(student_id) = text_of(student_id).and_then(|id| StudentId::new(id).ok()) else {
                skipped += 1;
                continue;
            };

            transactions.push(Transaction::new(
                student_id,
                text_of(sex),
                text_of(service_time),
                charge_of(net_charge),
            ));
        }

        if skipped > 0 {
            log::warn!(
                "Skipped {} rows of '{}' without a usable student_id",
                skipped,
                self.table
            );
        }

        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteTransactionSource {
        let mut source = SqliteTransactionSource::new_in_memory(DEFAULT_TABLE).unwrap();
        source.create_table().unwrap();
        source
            .insert_transactions_batch(&[
                Transaction::new(
                    StudentId::new("s1").unwrap(),
                    Some("M".to_string()),
                    Some("2024-01-15T07:30:00".to_string()),
                    50.0,
                ),
                Transaction::new(
                    StudentId::new("s2").unwrap(),
                    Some("F".to_string()),
                    Some("2024-01-15 12:00:00".to_string()),
                    30.0,
                ),
            ])
            .unwrap();
        source
    }

    #[test]
    fn test_create_table_idempotent() {
        let source = SqliteTransactionSource::new_in_memory("meals").unwrap();
        assert!(!source.table_exists("meals").unwrap());
        source.create_table().unwrap();
        source.create_table().unwrap();
        assert!(source.table_exists("meals").unwrap());
    }

    #[test]
    fn test_load_transactions() {
        let source = seeded();
        let rows = source.load_transactions().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].student_id.as_str(), "s1");
        assert_eq!(rows[0].sex.as_deref(), Some("M"));
        assert_eq!(rows[1].service_time.as_deref(), Some("2024-01-15 12:00:00"));
        assert_eq!(rows[1].net_charge, 30.0);
    }

    #[test]
    fn test_load_keeps_ids_with_commas() {
        let source = SqliteTransactionSource::new_in_memory(DEFAULT_TABLE).unwrap();
        source.create_table().unwrap();
        source
            .connection()
            .execute_batch(&format!(
                "INSERT INTO {t} VALUES ('ETS01,15', 'F', '2024-01-15 12:00:00', 30.0);
                 INSERT INTO {t} VALUES ('s1', 'M', '2024-01-15 12:05:00', 20.0);",
                t = DEFAULT_TABLE
            ))
            .unwrap();

        let rows = source.load_transactions().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].student_id.as_str(), "ETS01,15");
        assert_eq!(rows[0].sex.as_deref(), Some("F"));
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let source = SqliteTransactionSource::new_in_memory(DEFAULT_TABLE).unwrap();
        assert_eq!(
            source.load_transactions().unwrap_err(),
            SourceError::TableNotFound(DEFAULT_TABLE.to_string())
        );
    }

    #[test]
    fn test_invalid_table_name_rejected() {
        assert_eq!(
            SqliteTransactionSource::new_in_memory("x; DROP TABLE y").unwrap_err(),
            SourceError::InvalidTableName("x; DROP TABLE y".to_string())
        );
        assert!(SqliteTransactionSource::new_in_memory("").is_err());
        assert!(SqliteTransactionSource::new_in_memory("1abc").is_err());
    }

    #[test]
    fn test_open_missing_file_fails() {
        let result = SqliteTransactionSource::open("/nonexistent/dir/cafeteria.db", DEFAULT_TABLE);
        assert!(matches!(result, Err(SourceError::Open(_))));
    }

    #[test]
    fn test_loose_column_types() {
        let source = SqliteTransactionSource::new_in_memory("loose").unwrap();
        source
            .connection()
            .execute(
                "CREATE TABLE loose (student_id, sex, service_time, net_charge)",
                [],
            )
            .unwrap();
        source
            .connection()
            .execute_batch(
                "INSERT INTO loose VALUES (1001, 'F', '2024-01-15 12:00:00', '12.5');
                 INSERT INTO loose VALUES (1002, NULL, NULL, NULL);
                 INSERT INTO loose VALUES (NULL, 'M', '2024-01-15 12:00:00', 3);
                 INSERT INTO loose VALUES ('  ', 'M', '2024-01-15 12:00:00', 'n/a');",
            )
            .unwrap();

        let rows = source.load_transactions().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].student_id.as_str(), "1001");
        assert_eq!(rows[0].net_charge, 12.5);
        assert_eq!(rows[1].sex, None);
        assert_eq!(rows[1].service_time, None);
        assert_eq!(rows[1].net_charge, 0.0);
    }
}
