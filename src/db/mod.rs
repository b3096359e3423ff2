pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) the index database at the given path, with sqlite-vec
/// loaded, schema initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    load_sqlite_vec();

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(std::time::Duration::from_millis(5000))?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a migrated in-memory database (tests and dry runs).
pub fn open_in_memory() -> Result<Connection> {
    load_sqlite_vec();
    let mut conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&mut conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Result of [`check_database_health`].
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub sqlite_vec_version: String,
    pub embedding_model: Option<String>,
    pub chunk_count: i64,
    pub vector_count: i64,
    pub mirrored_files: i64,
    pub user_count: i64,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

/// Integrity check plus row counts for the `doctor` command.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    let count = |sql: &str| -> rusqlite::Result<i64> { conn.query_row(sql, [], |row| row.get(0)) };

    Ok(HealthReport {
        schema_version: migrations::get_schema_version(conn)?,
        sqlite_vec_version: conn.query_row("SELECT vec_version()", [], |row| row.get(0))?,
        embedding_model: migrations::get_embedding_model(conn)?,
        chunk_count: count("SELECT COUNT(*) FROM chunks")?,
        vector_count: count("SELECT COUNT(*) FROM chunks_vec")?,
        mirrored_files: count("SELECT COUNT(*) FROM vault_files")?,
        user_count: count("SELECT COUNT(DISTINCT user_id) FROM chunks")?,
        integrity_ok: integrity == "ok",
        integrity_details: integrity,
    })
}
