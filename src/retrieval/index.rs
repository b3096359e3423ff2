//! Write side of the retrieval index.
//!
//! A note's chunks are always replaced as a unit: [`index_note`] deletes the
//! old rows and inserts the new ones inside one transaction.

use rusqlite::{params, Connection, Transaction};
use serde::Serialize;

use super::{chunk_text, embedding_to_bytes};
use crate::embedding::EmbeddingProvider;
use crate::error::{CocoonError, Result};
use crate::vault::{front_matter, Vault};

/// Counts from a full rebuild of one user's index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    pub notes: usize,
    pub chunks: usize,
}

/// Replace the indexed chunks for one note. Returns the number of chunks stored.
pub fn index_note(
    conn: &mut Connection,
    user_id: &str,
    path: &str,
    chunks: &[String],
    embeddings: &[Vec<f32>],
) -> Result<usize> {
    if chunks.len() != embeddings.len() {
        return Err(CocoonError::Internal(format!(
            "{} chunks but {} embeddings for {path}",
            chunks.len(),
            embeddings.len()
        )));
    }

    let tx = conn.transaction()?;
    delete_note_chunks(&tx, user_id, path)?;
    insert_chunks(&tx, user_id, path, chunks, embeddings)?;
    tx.commit()?;

    tracing::debug!(user = %user_id, path = %path, chunks = chunks.len(), "note indexed");
    Ok(chunks.len())
}

/// Drop a note from the index. Returns how many chunks were removed.
pub fn remove_note(conn: &mut Connection, user_id: &str, path: &str) -> Result<usize> {
    let tx = conn.transaction()?;
    let removed = delete_note_chunks(&tx, user_id, path)?;
    tx.commit()?;
    Ok(removed)
}

/// Chunk and embed a note body (front-matter excluded).
pub fn prepare_note(
    embedder: &dyn EmbeddingProvider,
    content: &str,
    max_chars: usize,
) -> Result<(Vec<String>, Vec<Vec<f32>>)> {
    let chunks = chunk_text(front_matter::body(content), max_chars);
    if chunks.is_empty() {
        return Ok((chunks, Vec::new()));
    }
    let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let embeddings = embedder
        .embed_batch(&refs)
        .map_err(|e| CocoonError::Embedding(e.to_string()))?;
    Ok((chunks, embeddings))
}

/// Rebuild a user's index from the notes currently in their vault.
///
/// Embedding runs before the transaction opens, so a failure leaves the
/// previous index untouched.
pub fn reindex_user(
    conn: &mut Connection,
    vault: &Vault,
    embedder: &dyn EmbeddingProvider,
    max_chars: usize,
) -> Result<ReindexReport> {
    let documents = vault.load_documents()?;
    let mut prepared = Vec::with_capacity(documents.len());
    for note in &documents {
        let (chunks, embeddings) = prepare_note(embedder, &note.content, max_chars)?;
        prepared.push((note.path.as_str(), chunks, embeddings));
    }

    let user_id = vault.user_id();
    let tx = conn.transaction()?;
    delete_user_chunks(&tx, user_id)?;

    let mut report = ReindexReport::default();
    for (path, chunks, embeddings) in &prepared {
        insert_chunks(&tx, user_id, path, chunks, embeddings)?;
        report.notes += 1;
        report.chunks += chunks.len();
    }
    tx.commit()?;

    tracing::info!(user = %user_id, notes = report.notes, chunks = report.chunks, "index rebuilt");
    Ok(report)
}

/// Drop every chunk of a user. Returns how many were removed.
pub fn clear_user(conn: &mut Connection, user_id: &str) -> Result<usize> {
    let tx = conn.transaction()?;
    let removed = delete_user_chunks(&tx, user_id)?;
    tx.commit()?;
    Ok(removed)
}

/// Distinct user ids that currently have chunks, sorted.
pub fn indexed_users(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT user_id FROM chunks ORDER BY user_id")?;
    let users = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(users)
}

fn delete_user_chunks(tx: &Transaction, user_id: &str) -> Result<usize> {
    let ids = chunk_ids(tx, "SELECT id FROM chunks WHERE user_id = ?1", &[user_id])?;
    delete_vectors(tx, &ids)?;
    let removed = tx.execute("DELETE FROM chunks WHERE user_id = ?1", params![user_id])?;
    Ok(removed)
}

fn delete_note_chunks(tx: &Transaction, user_id: &str, path: &str) -> Result<usize> {
    let ids = chunk_ids(
        tx,
        "SELECT id FROM chunks WHERE user_id = ?1 AND path = ?2",
        &[user_id, path],
    )?;
    delete_vectors(tx, &ids)?;
    let removed = tx.execute(
        "DELETE FROM chunks WHERE user_id = ?1 AND path = ?2",
        params![user_id, path],
    )?;
    Ok(removed)
}

fn chunk_ids(tx: &Transaction, sql: &str, args: &[&str]) -> Result<Vec<String>> {
    let mut stmt = tx.prepare(sql)?;
    let ids = stmt
        .query_map(rusqlite::params_from_iter(args), |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

/// vec0 deletes go by primary key, one row at a time.
fn delete_vectors(tx: &Transaction, ids: &[String]) -> Result<()> {
    let mut stmt = tx.prepare("DELETE FROM chunks_vec WHERE id = ?1")?;
    for id in ids {
        stmt.execute(params![id])?;
    }
    Ok(())
}

fn insert_chunks(
    tx: &Transaction,
    user_id: &str,
    path: &str,
    chunks: &[String],
    embeddings: &[Vec<f32>],
) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    let mut insert_chunk = tx.prepare(
        "INSERT INTO chunks (id, user_id, path, position, content, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut insert_vec = tx.prepare("INSERT INTO chunks_vec (id, embedding) VALUES (?1, ?2)")?;

    for (position, (content, embedding)) in chunks.iter().zip(embeddings).enumerate() {
        let id = uuid::Uuid::now_v7().to_string();
        insert_chunk.execute(params![id, user_id, path, position as i64, content, now])?;
        insert_vec.execute(params![id, embedding_to_bytes(embedding)])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::embedding::hash::HashEmbeddingProvider;
    use tempfile::TempDir;

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn index_note_replaces_previous_chunks() {
        let mut conn = db::open_in_memory().unwrap();
        let embedder = HashEmbeddingProvider::new();

        let (chunks, embs) = prepare_note(&embedder, "one\ntwo\nthree", 6).unwrap();
        assert_eq!(index_note(&mut conn, "u1", "a.md", &chunks, &embs).unwrap(), 3);

        let (chunks, embs) = prepare_note(&embedder, "only", 500).unwrap();
        index_note(&mut conn, "u1", "a.md", &chunks, &embs).unwrap();

        assert_eq!(count(&conn, "SELECT COUNT(*) FROM chunks"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM chunks_vec"), 1);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut conn = db::open_in_memory().unwrap();
        let err = index_note(&mut conn, "u1", "a.md", &["x".to_string()], &[]).unwrap_err();
        assert!(matches!(err, CocoonError::Internal(_)));
    }

    #[test]
    fn prepare_skips_front_matter() {
        let embedder = HashEmbeddingProvider::new();
        let (chunks, embs) =
            prepare_note(&embedder, "---\ntype: dashboard\n---\n\n# Home\n", 500).unwrap();
        assert_eq!(chunks, vec!["# Home"]);
        assert_eq!(embs.len(), 1);
    }

    #[test]
    fn remove_note_only_touches_that_note() {
        let mut conn = db::open_in_memory().unwrap();
        let embedder = HashEmbeddingProvider::new();
        for path in ["a.md", "b.md"] {
            let (c, e) = prepare_note(&embedder, "text", 500).unwrap();
            index_note(&mut conn, "u1", path, &c, &e).unwrap();
        }
        assert_eq!(remove_note(&mut conn, "u1", "a.md").unwrap(), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM chunks WHERE path = 'b.md'"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM chunks_vec"), 1);
    }

    #[test]
    fn reindex_rebuilds_from_vault_and_spares_other_users() {
        let tmp = TempDir::new().unwrap();
        let mut conn = db::open_in_memory().unwrap();
        let embedder = HashEmbeddingProvider::new();

        let (c, e) = prepare_note(&embedder, "bob's note", 500).unwrap();
        index_note(&mut conn, "bob", "b.md", &c, &e).unwrap();
        let (c, e) = prepare_note(&embedder, "stale", 500).unwrap();
        index_note(&mut conn, "alice", "deleted.md", &c, &e).unwrap();

        let vault = Vault::open(tmp.path(), "alice").unwrap();
        vault.write_note("one.md", "first note", None).unwrap();
        vault.write_note("dir/two.txt", "second note", None).unwrap();

        let report = reindex_user(&mut conn, &vault, &embedder, 500).unwrap();
        assert_eq!(report, ReindexReport { notes: 2, chunks: 2 });

        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM chunks WHERE path = 'deleted.md'"),
            0
        );
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM chunks WHERE user_id = 'bob'"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM chunks_vec"), 3);
    }

    #[test]
    fn clear_user_leaves_other_users_indexed() {
        let mut conn = db::open_in_memory().unwrap();
        let embedder = HashEmbeddingProvider::new();
        for user in ["carol", "alice"] {
            let (c, e) = prepare_note(&embedder, "one\ntwo", 6).unwrap();
            index_note(&mut conn, user, "a.md", &c, &e).unwrap();
        }
        assert_eq!(indexed_users(&conn).unwrap(), vec!["alice", "carol"]);

        assert_eq!(clear_user(&mut conn, "carol").unwrap(), 2);
        assert_eq!(indexed_users(&conn).unwrap(), vec!["alice"]);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM chunks_vec"), 2);
    }
}
