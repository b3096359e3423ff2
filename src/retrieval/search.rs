//! Top-k similarity query over one user's chunks.

use rusqlite::{params, Connection};
use serde::Serialize;

use super::embedding_to_bytes;
use crate::error::{CocoonError, Result};

/// A retrieved chunk with its cosine distance to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkHit {
    pub path: String,
    pub position: usize,
    pub content: String,
    pub distance: f64,
    /// `1 - distance`, i.e. cosine similarity.
    pub score: f64,
}

/// Return the `top_k` chunks of `user_id` closest to `query_embedding`.
///
/// Ordered by ascending cosine distance, ties by path then position. Chunks
/// whose distance is undefined (zero vectors) are skipped.
pub fn search(
    conn: &Connection,
    user_id: &str,
    query_embedding: &[f32],
    top_k: usize,
) -> Result<Vec<ChunkHit>> {
    if top_k == 0 {
        return Err(CocoonError::Validation("top_k must be at least 1".into()));
    }
    if query_embedding.iter().all(|x| *x == 0.0) {
        tracing::debug!(user = %user_id, "query embedding is empty; nothing to match");
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT c.path, c.position, c.content, vec_distance_cosine(v.embedding, ?2) AS distance \
         FROM chunks c JOIN chunks_vec v ON v.id = c.id \
         WHERE c.user_id = ?1 \
         ORDER BY distance IS NULL, distance, c.path, c.position \
         LIMIT ?3",
    )?;

    let rows = stmt
        .query_map(
            params![user_id, embedding_to_bytes(query_embedding), top_k as i64],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            },
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let hits = rows
        .into_iter()
        .filter_map(|(path, position, content, distance)| {
            let distance = distance.filter(|d| d.is_finite())?;
            Some(ChunkHit {
                path,
                position: position as usize,
                content,
                distance,
                score: 1.0 - distance,
            })
        })
        .collect::<Vec<_>>();

    tracing::debug!(user = %user_id, top_k, hits = hits.len(), "similarity search");
    Ok(hits)
}

/// Join hit contents into one context block, separated by blank lines.
pub fn join_context(hits: &[ChunkHit]) -> String {
    hits.iter()
        .map(|h| h.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
