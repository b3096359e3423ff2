//! Mirroring of note files to a table store.
//!
//! After a note is written locally, a row keyed by `(user_id, path)` is
//! upserted into the configured [`TableMirror`]. Mirror failures are reported
//! to the caller but never undo the local write.

pub mod rest;
pub mod sqlite;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::MirrorConfig;
use crate::error::Result;

/// One mirrored note row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorRecord {
    pub user_id: String,
    pub path: String,
    pub content: String,
    pub file_type: String,
    pub metadata: Map<String, Value>,
    pub updated_at: String,
}

impl MirrorRecord {
    pub fn new(
        user_id: &str,
        path: &str,
        content: &str,
        metadata: Option<&Map<String, Value>>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            path: path.to_string(),
            content: content.to_string(),
            file_type: crate::vault::file_type(path),
            metadata: metadata.cloned().unwrap_or_default(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[async_trait]
pub trait TableMirror: Send + Sync {
    /// Insert or replace the row for `(record.user_id, record.path)`.
    async fn upsert(&self, record: &MirrorRecord) -> Result<()>;

    /// Remove the row for `(user_id, path)`. Missing rows are not an error.
    async fn delete(&self, user_id: &str, path: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Mirror that drops every record.
#[derive(Debug, Default)]
pub struct NoopMirror;

#[async_trait]
impl TableMirror for NoopMirror {
    async fn upsert(&self, _record: &MirrorRecord) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _user_id: &str, _path: &str) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Build the configured mirror. The sqlite mirror shares the index connection.
pub fn create_mirror(
    config: &MirrorConfig,
    db: Arc<Mutex<Connection>>,
) -> anyhow::Result<Arc<dyn TableMirror>> {
    match config.provider.as_str() {
        "sqlite" => Ok(Arc::new(sqlite::SqliteMirror::new(db))),
        "rest" => Ok(Arc::new(rest::RestMirror::new(config)?)),
        "none" => Ok(Arc::new(NoopMirror)),
        other => anyhow::bail!("unknown mirror provider: {other}. Supported: sqlite, rest, none"),
    }
}
