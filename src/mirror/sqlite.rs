//! Local `vault_files` table mirror, stored alongside the retrieval index.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::{MirrorRecord, TableMirror};
use crate::error::{CocoonError, Result};

pub struct SqliteMirror {
    db: Arc<Mutex<Connection>>,
}

impl SqliteMirror {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| CocoonError::Internal(format!("db lock poisoned: {e}")))?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl TableMirror for SqliteMirror {
    async fn upsert(&self, record: &MirrorRecord) -> Result<()> {
        let record = record.clone();
        self.with_conn(move |conn| upsert_record(conn, &record)).await
    }

    async fn delete(&self, user_id: &str, path: &str) -> Result<()> {
        let (user_id, path) = (user_id.to_string(), path.to_string());
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM vault_files WHERE user_id = ?1 AND path = ?2",
                params![user_id, path],
            )?;
            Ok(())
        })
        .await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

pub fn upsert_record(conn: &Connection, record: &MirrorRecord) -> Result<()> {
    let metadata = serde_json::to_string(&record.metadata)?;
    conn.execute(
        "INSERT INTO vault_files (user_id, path, content, file_type, metadata, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT(user_id, path) DO UPDATE SET \
           content = excluded.content, \
           file_type = excluded.file_type, \
           metadata = excluded.metadata, \
           updated_at = excluded.updated_at",
        params![
            record.user_id,
            record.path,
            record.content,
            record.file_type,
            metadata,
            record.updated_at,
        ],
    )?;
    Ok(())
}

/// Fetch a mirrored row, if present.
pub fn get_record(conn: &Connection, user_id: &str, path: &str) -> Result<Option<MirrorRecord>> {
    let row = conn
        .query_row(
            "SELECT user_id, path, content, file_type, metadata, updated_at \
             FROM vault_files WHERE user_id = ?1 AND path = ?2",
            params![user_id, path],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    row.map(|(user_id, path, content, file_type, metadata, updated_at)| {
        Ok(MirrorRecord {
            user_id,
            path,
            content,
            file_type,
            metadata: serde_json::from_str(&metadata)?,
            updated_at,
        })
    })
    .transpose()
}
