//! SQLite-backed queue service.
//!
//! Queues live in one table, messages in another. Receiving a message stamps
//! it with a fresh receipt handle and pushes its `visible_after` forward by
//! the visibility timeout; only a delete with that handle removes it.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::config::QueueConfig;

use super::{queue_name_from_url, QueueError, QueueService, ReceivedMessage};

/// SQLite-backed queue service.
pub struct SqliteQueueService {
    conn: Mutex<Connection>,
    base_url: String,
    visibility_timeout_ms: i64,
}

impl SqliteQueueService {
    /// Open (or create) the queue database at `path`.
    pub fn new(path: &Path, config: &QueueConfig) -> Result<Self, QueueError> {
        let conn = Connection::open(path).map_err(|e| QueueError::Backend(e.to_string()))?;
        Self::from_connection(conn, config)
    }

    /// Create an in-memory queue service (useful for testing).
    pub fn in_memory(config: &QueueConfig) -> Result<Self, QueueError> {
        let conn = Connection::open_in_memory().map_err(|e| QueueError::Backend(e.to_string()))?;
        Self::from_connection(conn, config)
    }

    fn from_connection(conn: Connection, config: &QueueConfig) -> Result<Self, QueueError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS queues (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS queue_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                queue_name TEXT NOT NULL,
                body TEXT NOT NULL,
                receipt_handle TEXT,
                visible_after INTEGER NOT NULL,
                receive_count INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_queue_messages_queue ON queue_messages(queue_name, visible_after);
            "#,
        )
        .map_err(|e| QueueError::Backend(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            visibility_timeout_ms: (config.visibility_timeout_secs as i64) * 1000,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, QueueError> {
        self.conn
            .lock()
            .map_err(|_| QueueError::Backend("connection lock poisoned".to_string()))
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    fn queue_exists(conn: &Connection, name: &str) -> Result<bool, QueueError> {
        conn.query_row("SELECT 1 FROM queues WHERE name = ?", params![name], |_| Ok(()))
            .optional()
            .map(|row| row.is_some())
            .map_err(|e| QueueError::Backend(e.to_string()))
    }

    fn existing_queue<'a>(conn: &Connection, queue_url: &'a str) -> Result<&'a str, QueueError> {
        let name = queue_name_from_url(queue_url);
        if !Self::queue_exists(conn, name)? {
            return Err(QueueError::QueueNotFound {
                url: queue_url.to_string(),
            });
        }
        Ok(name)
    }

    /// Provision a queue, returning its url. Creating an existing queue is a no-op.
    pub fn create_queue(&self, name: &str) -> Result<String, QueueError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO queues (name, created_at) VALUES (?, ?)",
            params![name, Utc::now().to_rfc3339()],
        )
        .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(self.url_for(name))
    }

    /// Append a message to a queue.
    pub fn send_message(&self, queue_url: &str, body: &str) -> Result<(), QueueError> {
        let conn = self.lock()?;
        let name = Self::existing_queue(&conn, queue_url)?;
        conn.execute(
            "INSERT INTO queue_messages (queue_name, body, visible_after) VALUES (?, ?, ?)",
            params![name, body, Utc::now().timestamp_millis()],
        )
        .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Remove a queue and every message in it.
    pub fn remove_queue(&self, queue_url: &str) -> Result<(), QueueError> {
        let conn = self.lock()?;
        let name = queue_name_from_url(queue_url);
        conn.execute("DELETE FROM queue_messages WHERE queue_name = ?", params![name])
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        conn.execute("DELETE FROM queues WHERE name = ?", params![name])
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Number of messages in a queue, visible or not.
    pub fn depth(&self, queue_url: &str) -> Result<u64, QueueError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*) FROM queue_messages WHERE queue_name = ?",
            params![queue_name_from_url(queue_url)],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count as u64)
        .map_err(|e| QueueError::Backend(e.to_string()))
    }
}

#[async_trait]
impl QueueService for SqliteQueueService {
    async fn resolve_url_by_prefix(&self, prefix: &str) -> Result<Option<String>, QueueError> {
        let conn = self.lock()?;
        let name: Option<String> = conn
            .query_row(
                "SELECT name FROM queues WHERE substr(name, 1, length(?1)) = ?1 ORDER BY name LIMIT 1",
                params![prefix],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(name.map(|n| self.url_for(&n)))
    }

    async fn receive_one(&self, queue_url: &str) -> Result<Option<ReceivedMessage>, QueueError> {
        let conn = self.lock()?;
        let name = Self::existing_queue(&conn, queue_url)?;
        let now = Utc::now().timestamp_millis();

        let next: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, body FROM queue_messages WHERE queue_name = ? AND visible_after <= ? ORDER BY id LIMIT 1",
                params![name, now],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| QueueError::Backend(e.to_string()))?;

        let Some((id, body)) = next else {
            debug!("No visible message in {}", queue_url);
            return Ok(None);
        };

        let receipt_handle = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "UPDATE queue_messages SET receipt_handle = ?, visible_after = ?, receive_count = receive_count + 1 WHERE id = ?",
            params![receipt_handle, now + self.visibility_timeout_ms, id],
        )
        .map_err(|e| QueueError::Backend(e.to_string()))?;

        Ok(Some(ReceivedMessage {
            body,
            receipt_handle,
        }))
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueError> {
        let conn = self.lock()?;
        let name = Self::existing_queue(&conn, queue_url)?;
        let deleted = conn
            .execute(
                "DELETE FROM queue_messages WHERE queue_name = ? AND receipt_handle = ?",
                params![name, receipt_handle],
            )
            .map_err(|e| QueueError::Backend(e.to_string()))?;

        if deleted == 0 {
            warn!(
                "Receipt handle {} matched no message in {} (already deleted or re-received)",
                receipt_handle, queue_url
            );
        }
        Ok(())
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<String>, QueueError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT name FROM queues WHERE substr(name, 1, length(?1)) = ?1 ORDER BY name")
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        let names = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))
            .map_err(|e| QueueError::Backend(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(names.iter().map(|n| self.url_for(n)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(visibility_timeout_secs: u64) -> SqliteQueueService {
        SqliteQueueService::in_memory(&QueueConfig {
            base_url: "local://queues/".to_string(),
            visibility_timeout_secs,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_queue_returns_url() {
        let queues = service(30);
        let url = queues.create_queue("pfx-ar-invoice.fifo").unwrap();
        assert_eq!(url, "local://queues/pfx-ar-invoice.fifo");
        // idempotent
        assert_eq!(queues.create_queue("pfx-ar-invoice.fifo").unwrap(), url);
        assert_eq!(queues.list_by_prefix("pfx").await.unwrap(), vec![url]);
    }

    #[tokio::test]
    async fn test_resolve_url_by_prefix() {
        let queues = service(30);
        queues.create_queue("pfx-ar-receipt.fifo").unwrap();
        queues.create_queue("pfx-ar-invoice.fifo").unwrap();

        let url = queues.resolve_url_by_prefix("pfx-ar-invoice").await.unwrap();
        assert_eq!(url.as_deref(), Some("local://queues/pfx-ar-invoice.fifo"));

        let missing = queues.resolve_url_by_prefix("pfx-cl").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_prefix_is_not_a_pattern() {
        let queues = service(30);
        queues.create_queue("pfx-ar-invoice").unwrap();
        assert!(queues.list_by_prefix("pfx%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_receive_hides_message_until_deleted() {
        let queues = service(30);
        let url = queues.create_queue("pfx-ar-invoice.fifo").unwrap();
        queues.send_message(&url, r#"{"n":1}"#).unwrap();
        queues.send_message(&url, r#"{"n":2}"#).unwrap();

        let first = queues.receive_one(&url).await.unwrap().unwrap();
        assert_eq!(first.body, r#"{"n":1}"#);

        let second = queues.receive_one(&url).await.unwrap().unwrap();
        assert_eq!(second.body, r#"{"n":2}"#);
        assert_ne!(first.receipt_handle, second.receipt_handle);

        assert!(queues.receive_one(&url).await.unwrap().is_none());

        queues.delete_message(&url, &first.receipt_handle).await.unwrap();
        assert_eq!(queues.depth(&url).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_undeleted_message_reappears_after_visibility_timeout() {
        let queues = service(0);
        let url = queues.create_queue("pfx-ar-invoice.fifo").unwrap();
        queues.send_message(&url, "{}").unwrap();

        let first = queues.receive_one(&url).await.unwrap().unwrap();
        let again = queues.receive_one(&url).await.unwrap().unwrap();
        assert_eq!(first.body, again.body);
        assert_ne!(first.receipt_handle, again.receipt_handle);

        // the stale handle no longer deletes anything
        queues.delete_message(&url, &first.receipt_handle).await.unwrap();
        assert_eq!(queues.depth(&url).unwrap(), 1);

        queues.delete_message(&url, &again.receipt_handle).await.unwrap();
        assert_eq!(queues.depth(&url).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_receive_from_unknown_queue_fails() {
        let queues = service(30);
        let err = queues
            .receive_one("local://queues/missing")
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::QueueNotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_queue_drops_messages() {
        let queues = service(30);
        let url = queues.create_queue("pfx-ar-invoice.fifo").unwrap();
        queues.send_message(&url, "{}").unwrap();

        queues.remove_queue(&url).unwrap();

        assert!(queues.list_by_prefix("pfx").await.unwrap().is_empty());
        assert_eq!(queues.depth(&url).unwrap(), 0);
    }
}
