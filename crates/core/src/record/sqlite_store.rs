//! SQLite-backed operational record store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use super::{HashId, OperationalRecord, RecordStore, RecordStoreError};

const SELECT_COLUMNS: &str =
    "SELECT hash_id, exec_date_time, is_status, from_date_time, to_date_time, attributes FROM operational";

/// SQLite-backed operational record store.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) the store at `path`.
    pub fn new(path: &Path) -> Result<Self, RecordStoreError> {
        let conn = Connection::open(path).map_err(|e| RecordStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, RecordStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| RecordStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RecordStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS operational (
                hash_id TEXT NOT NULL,
                exec_date_time TEXT NOT NULL,
                is_status TEXT,
                from_date_time TEXT,
                to_date_time TEXT,
                attributes TEXT NOT NULL DEFAULT '{}',
                PRIMARY KEY (hash_id, exec_date_time)
            );

            CREATE INDEX IF NOT EXISTS idx_operational_status ON operational(hash_id, is_status);
            "#,
        )
        .map_err(|e| RecordStoreError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RecordStoreError> {
        self.conn
            .lock()
            .map_err(|_| RecordStoreError::Database("connection lock poisoned".to_string()))
    }

    /// Insert or replace a record.
    pub fn put(&self, record: &OperationalRecord) -> Result<(), RecordStoreError> {
        let attributes = serde_json::to_string(&record.attributes)
            .map_err(|e| RecordStoreError::Serialization(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO operational (hash_id, exec_date_time, is_status, from_date_time, to_date_time, attributes) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.hash_id.as_str(),
                record.exec_date_time,
                record.is_status,
                record.from_date_time,
                record.to_date_time,
                attributes,
            ],
        )
        .map_err(|e| RecordStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<(OperationalRecord, String)> {
        let hash_id: String = row.get(0)?;
        let exec_date_time: String = row.get(1)?;
        let record = OperationalRecord {
            hash_id: HashId::from(hash_id),
            exec_date_time,
            is_status: row.get(2)?,
            from_date_time: row.get(3)?,
            to_date_time: row.get(4)?,
            attributes: Map::new(),
        };
        let attributes: String = row.get(5)?;
        Ok((record, attributes))
    }

    fn decode(
        row: Option<(OperationalRecord, String)>,
    ) -> Result<Option<OperationalRecord>, RecordStoreError> {
        row.map(|(mut record, attributes)| {
            record.attributes = serde_json::from_str::<Map<String, Value>>(&attributes)
                .map_err(|e| RecordStoreError::Serialization(e.to_string()))?;
            Ok(record)
        })
        .transpose()
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn latest_by_key(
        &self,
        hash_id: &HashId,
    ) -> Result<Option<OperationalRecord>, RecordStoreError> {
        let row = {
            let conn = self.lock()?;
            conn.query_row(
                &format!(
                    "{} WHERE hash_id = ? ORDER BY exec_date_time DESC LIMIT 1",
                    SELECT_COLUMNS
                ),
                params![hash_id.as_str()],
                Self::row_to_record,
            )
            .optional()
            .map_err(|e| RecordStoreError::Database(e.to_string()))?
        };
        Self::decode(row)
    }

    async fn exists_by_key_and_status(
        &self,
        hash_id: &HashId,
        status: &str,
    ) -> Result<bool, RecordStoreError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM operational WHERE hash_id = ? AND is_status = ?",
                params![hash_id.as_str(), status],
                |row| row.get(0),
            )
            .map_err(|e| RecordStoreError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    async fn by_key_and_exec_date_time(
        &self,
        hash_id: &HashId,
        exec_date_time: &str,
    ) -> Result<Option<OperationalRecord>, RecordStoreError> {
        let row = {
            let conn = self.lock()?;
            conn.query_row(
                &format!(
                    "{} WHERE hash_id = ? AND exec_date_time = ?",
                    SELECT_COLUMNS
                ),
                params![hash_id.as_str(), exec_date_time],
                Self::row_to_record,
            )
            .optional()
            .map_err(|e| RecordStoreError::Database(e.to_string()))?
        };
        Self::decode(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(exec: &str, status: &str) -> OperationalRecord {
        OperationalRecord::new("pfx-ar-invoice", exec).with_status(status)
    }

    #[tokio::test]
    async fn test_latest_by_key_returns_most_recent() {
        let store = SqliteRecordStore::in_memory().unwrap();
        store.put(&record("2024-01-01 10:00:00.000", "OK")).unwrap();
        store.put(&record("2024-01-03 10:00:00.000", "ERROR")).unwrap();
        store.put(&record("2024-01-02 10:00:00.000", "OK")).unwrap();

        let latest = store
            .latest_by_key(&HashId::from("pfx-ar-invoice"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.exec_date_time, "2024-01-03 10:00:00.000");
        assert!(latest.has_status("ERROR"));
    }

    #[tokio::test]
    async fn test_latest_by_key_absent() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let latest = store
            .latest_by_key(&HashId::from("pfx-ar-receipt"))
            .await
            .unwrap();
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn test_exists_by_key_and_status() {
        let store = SqliteRecordStore::in_memory().unwrap();
        store.put(&record("2024-01-01 10:00:00.000", "PROCESSING")).unwrap();

        let id = HashId::from("pfx-ar-invoice");
        assert!(store.exists_by_key_and_status(&id, "PROCESSING").await.unwrap());
        assert!(!store.exists_by_key_and_status(&id, "ERROR").await.unwrap());
        assert!(!store
            .exists_by_key_and_status(&HashId::from("pfx-cl-invoice"), "PROCESSING")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_point_lookup_keeps_attributes() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let stored = record("2024-01-01 10:00:00.000", "OK")
            .with_window(Some("2024-01-01 00:00:00.000"), Some("2024-01-01 09:00:00.000"))
            .with_attribute("rows", json!(7));
        store.put(&stored).unwrap();

        let found = store
            .by_key_and_exec_date_time(&HashId::from("pfx-ar-invoice"), "2024-01-01 10:00:00.000")
            .await
            .unwrap();
        assert_eq!(found, Some(stored));

        let missing = store
            .by_key_and_exec_date_time(&HashId::from("pfx-ar-invoice"), "2024-01-01 10:00:00.001")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.db");

        {
            let store = SqliteRecordStore::new(&path).unwrap();
            store.put(&record("2024-01-01 10:00:00.000", "OK")).unwrap();
        }

        let store = SqliteRecordStore::new(&path).unwrap();
        let latest = store
            .latest_by_key(&HashId::from("pfx-ar-invoice"))
            .await
            .unwrap();
        assert!(latest.is_some());
    }
}
