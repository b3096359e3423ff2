//! Text-to-vector embedding.
//!
//! [`EmbeddingProvider`] is implemented by the ONNX-backed
//! [`local::LocalEmbeddingProvider`] and the dependency-free
//! [`hash::HashEmbeddingProvider`]. Both produce L2-normalized vectors of
//! [`EMBEDDING_DIM`] dimensions so they share one vector table.

pub mod hash;
pub mod local;

use anyhow::Result;

/// Number of dimensions in the embedding vectors (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Trait for embedding text into vectors.
///
/// All methods are synchronous; callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Create an embedding provider from config.
///
/// `"local"` needs model files on disk (run `cocoon model download` first);
/// `"hash"` works offline.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => Ok(Box::new(local::LocalEmbeddingProvider::new(config)?)),
        "hash" => Ok(Box::new(hash::HashEmbeddingProvider::new())),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local, hash"),
    }
}

/// Identifier stored in the index so a provider change can be detected.
pub fn model_id(config: &crate::config::EmbeddingConfig) -> String {
    match config.provider.as_str() {
        "hash" => hash::MODEL_ID.to_string(),
        _ => config.model.clone(),
    }
}

/// L2-normalize a vector in place. A zero vector is left unchanged.
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
