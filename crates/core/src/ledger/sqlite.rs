//! SQLite-backed ledger implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{CodeRecord, CodeStatus, Ledger, LedgerError};

/// SQLite-backed status ledger.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open (or create) the ledger database file and its table.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let conn = Connection::open(path).map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory ledger (useful for testing).
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn =
            Connection::open_in_memory().map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LedgerError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS processed_codes (
                code TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_processed_codes_status ON processed_codes(status);
            "#,
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<CodeRecord> {
        let code: String = row.get(0)?;
        let status_str: String = row.get(1)?;
        let created_at_str: String = row.get(2)?;
        let updated_at_str: String = row.get(3)?;

        // Parse timestamps - use now if parsing fails (shouldn't happen with valid data)
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let status = CodeStatus::parse(&status_str).unwrap_or(CodeStatus::Failed);

        Ok(CodeRecord {
            code,
            status,
            created_at,
            updated_at,
        })
    }
}

impl Ledger for SqliteLedger {
    fn is_completed(&self, code: &str) -> Result<bool, LedgerError> {
        let conn = self.conn.lock().unwrap();

        let result: Result<String, rusqlite::Error> = conn.query_row(
            "SELECT status FROM processed_codes WHERE code = ?",
            params![code],
            |row| row.get(0),
        );

        match result {
            Ok(status) => Ok(status == CodeStatus::Completed.as_str()),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(LedgerError::Database(e.to_string())),
        }
    }

    fn mark(&self, code: &str, status: CodeStatus) -> Result<(), LedgerError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        // created_at is only set on first insert; later marks keep it.
        conn.execute(
            "INSERT INTO processed_codes (code, status, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(code) DO UPDATE SET
                 status = excluded.status,
                 updated_at = excluded.updated_at",
            params![code, status.as_str(), now, now],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }

    fn touch(&self, code: &str) -> Result<(), LedgerError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "UPDATE processed_codes SET updated_at = ? WHERE code = ?",
            params![now, code],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }

    fn get(&self, code: &str) -> Result<Option<CodeRecord>, LedgerError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT code, status, created_at, updated_at FROM processed_codes WHERE code = ?",
            params![code],
            Self::row_to_record,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LedgerError::Database(e.to_string())),
        }
    }
}
