//! Chunk, embed, index and query note text.
//!
//! Chunks live in `chunks` and their vectors in the `chunks_vec` vec0 table,
//! joined by chunk id. Distances come from sqlite-vec.

pub mod chunk;
pub mod index;
pub mod search;

pub use chunk::chunk_text;
pub use index::{
    clear_user, index_note, indexed_users, reindex_user, remove_note, ReindexReport,
};
pub use search::{search, ChunkHit};

/// View an f32 embedding as raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            std::mem::size_of_val(embedding),
        )
    }
}
