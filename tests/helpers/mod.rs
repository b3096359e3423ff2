#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use cocoon::config::CocoonConfig;
use cocoon::db;
use cocoon::embedding::hash::HashEmbeddingProvider;
use cocoon::mirror::sqlite::SqliteMirror;
use cocoon::mirror::TableMirror;
use cocoon::service::{NoteService, SharedDb};
use rusqlite::Connection;
use tempfile::TempDir;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::load_sqlite_vec();
    let mut conn = Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&mut conn).unwrap();
    conn
}

/// Generate a deterministic 384-dim embedding with a spike at position `seed`.
/// Each seed produces a distinct, orthogonal vector.
pub fn test_embedding(seed: u16) -> Vec<f32> {
    let mut v = vec![0.0f32; 384];
    v[seed as usize % 384] = 1.0;
    v
}

/// Generate an embedding close to `base` (high cosine similarity).
pub fn similar_embedding(base: &[f32]) -> Vec<f32> {
    let mut v = base.to_vec();
    for i in 0..5 {
        v[(i * 37) % 384] += 0.05;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Config pointing every path into `tmp`, with the offline embedder.
pub fn test_config(tmp: &TempDir) -> CocoonConfig {
    let mut config = CocoonConfig::default();
    config.vault.root = tmp.path().join("vaults").to_string_lossy().into_owned();
    config.storage.db_path = tmp.path().join("index.db").to_string_lossy().into_owned();
    config.embedding.provider = "hash".into();
    config.embedding.cache_dir = tmp.path().join("models").to_string_lossy().into_owned();
    config
}

/// Service over an in-memory DB with the sqlite mirror sharing the connection.
pub fn test_service(tmp: &TempDir) -> (NoteService, SharedDb) {
    let db: SharedDb = Arc::new(Mutex::new(test_db()));
    let mirror: Arc<dyn TableMirror> = Arc::new(SqliteMirror::new(Arc::clone(&db)));
    let service = with_mirror(tmp, Arc::clone(&db), mirror);
    (service, db)
}

pub fn with_mirror(tmp: &TempDir, db: SharedDb, mirror: Arc<dyn TableMirror>) -> NoteService {
    NoteService::new(
        db,
        Arc::new(HashEmbeddingProvider::new()),
        mirror,
        None,
        Arc::new(test_config(tmp)),
    )
}

pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}
