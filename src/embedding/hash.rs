//! Feature-hashing bag-of-words embedder.
//!
//! Each lowercased alphanumeric token is hashed with XXH3-64 (seed 0) into one
//! of [`EMBEDDING_DIM`] buckets with a hash-derived sign, then the vector is
//! L2-normalized. Texts that share vocabulary land close together. The hash has
//! a fixed specification, so stored vectors stay valid across toolchains.

use anyhow::Result;
use xxhash_rust::xxh3::xxh3_64;

use super::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};

/// Names the hash function so a change of scheme shows up as a model change.
pub const MODEL_ID: &str = "feature-hash-xxh3-384";

#[derive(Debug, Default, Clone, Copy)]
pub struct HashEmbeddingProvider;

impl HashEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }
}

impl EmbeddingProvider for HashEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for token in tokens(text) {
            let (bucket, sign) = slot(xxh3_64(token.as_bytes()));
            v[bucket] += sign;
        }
        l2_normalize(&mut v);
        Ok(v)
    }
}

/// Bucket from the hash modulo the dimension, sign from its top bit.
fn slot(hash: u64) -> (usize, f32) {
    let bucket = (hash % EMBEDDING_DIM as u64) as usize;
    let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
    (bucket, sign)
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
