//! SQLite-backed staging store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::{Map, Value};

use super::store::{StagedPayment, StagingError, StagingStore};
use crate::timestamp::now_exec_datetime;

/// Stores payment events in the `temporary_payments` table.
pub struct SqliteStagingStore {
    conn: Mutex<Connection>,
}

impl SqliteStagingStore {
    /// Open (or create) the store at `path`.
    pub fn new(path: &Path) -> Result<Self, StagingError> {
        let conn = Connection::open(path).map_err(|e| StagingError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StagingError> {
        let conn = Connection::open_in_memory().map_err(|e| StagingError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StagingError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS temporary_payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                organization_code TEXT,
                payment TEXT NOT NULL,
                staged_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_temporary_payments_org ON temporary_payments(organization_code);
            "#,
        )
        .map_err(|e| StagingError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StagingError> {
        self.conn
            .lock()
            .map_err(|_| StagingError::Database("connection lock poisoned".to_string()))
    }

    /// Every staged payment, oldest first.
    pub fn list(&self) -> Result<Vec<StagedPayment>, StagingError> {
        let rows = {
            let conn = self.lock()?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, organization_code, payment, staged_at FROM temporary_payments ORDER BY id",
                )
                .map_err(|e| StagingError::Database(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })
                .map_err(|e| StagingError::Database(e.to_string()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StagingError::Database(e.to_string()))?;
            rows
        };

        rows.into_iter()
            .map(|(id, organization_code, payment, staged_at)| {
                let payment = serde_json::from_str(&payment)
                    .map_err(|e| StagingError::Serialization(e.to_string()))?;
                Ok(StagedPayment {
                    id,
                    organization_code,
                    payment,
                    staged_at,
                })
            })
            .collect()
    }

    /// Number of staged payments.
    pub fn count(&self) -> Result<usize, StagingError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM temporary_payments", [], |row| row.get(0))
            .map_err(|e| StagingError::Database(e.to_string()))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl StagingStore for SqliteStagingStore {
    async fn append(&self, payment: &Map<String, Value>) -> Result<i64, StagingError> {
        let organization_code = payment
            .get("organization_code")
            .and_then(Value::as_str)
            .map(String::from);
        let body =
            serde_json::to_string(payment).map_err(|e| StagingError::Serialization(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO temporary_payments (organization_code, payment, staged_at) VALUES (?, ?, ?)",
            params![organization_code, body, now_exec_datetime()],
        )
        .map_err(|e| StagingError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }
}
