//! ONNX Runtime embedding provider (all-MiniLM-L6-v2 by default).
//!
//! Tokenize with HuggingFace `tokenizers`, run the model through `ort`, then
//! masked mean pooling over token embeddings and L2 normalization.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer};

use super::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// Sentence-transformers models in this family were trained at 256 tokens.
const MAX_SEQ_LEN: usize = 256;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: Tokenizer is Send+Sync and the Session is only used behind the Mutex.
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

/// Paths of the model and tokenizer files inside the configured cache dir.
pub fn model_files(config: &EmbeddingConfig) -> (PathBuf, PathBuf) {
    let cache_dir = crate::config::expand_tilde(&config.cache_dir);
    (cache_dir.join(MODEL_FILE), cache_dir.join(TOKENIZER_FILE))
}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model_path, tokenizer_path) = model_files(config);

        anyhow::ensure!(
            model_path.exists(),
            "{} not found at {}. Run `cocoon model download` first.",
            config.model,
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer not found at {}. Run `cocoon model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .with_context(|| format!("failed to load ONNX model {}", model_path.display()))?;
        tracing::info!(model = %config.model, path = %model_path.display(), "ONNX model loaded");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }
}

/// Flattened `[batch, seq]` model inputs.
struct BatchInputs {
    batch_size: usize,
    seq_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
}

impl BatchInputs {
    fn from_encodings(encodings: &[Encoding]) -> Self {
        let batch_size = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_len);
        for encoding in encodings {
            input_ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        }
        Self {
            batch_size,
            seq_len,
            input_ids,
            attention_mask,
        }
    }

    fn shape(&self) -> Vec<i64> {
        vec![self.batch_size as i64, self.seq_len as i64]
    }
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .context("model returned no embedding")
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;
        let inputs = BatchInputs::from_encodings(&encodings);

        let shape = inputs.shape();
        let input_ids = Tensor::from_array((shape.clone(), inputs.input_ids.clone().into_boxed_slice()))?;
        let attention_mask =
            Tensor::from_array((shape.clone(), inputs.attention_mask.clone().into_boxed_slice()))?;
        // single-segment input
        let token_type_ids = Tensor::from_array((
            shape,
            vec![0i64; inputs.batch_size * inputs.seq_len].into_boxed_slice(),
        ))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids,
        })?;

        // Output name depends on the export; fall back to the first output.
        let token_embeddings = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);
        let (out_shape, data) = token_embeddings
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings")?;

        let dims: &[i64] = &out_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == EMBEDDING_DIM as i64,
            "unexpected token embedding shape {dims:?}, expected [batch, seq, {EMBEDDING_DIM}]"
        );

        Ok(mean_pool(
            data,
            &inputs.attention_mask,
            inputs.batch_size,
            inputs.seq_len,
            dims[1] as usize,
            dims[2] as usize,
        ))
    }
}

/// Masked mean pooling of `[batch, out_seq, hidden]` token embeddings, L2-normalized.
fn mean_pool(
    data: &[f32],
    attention_mask: &[i64],
    batch_size: usize,
    mask_seq_len: usize,
    out_seq_len: usize,
    hidden: usize,
) -> Vec<Vec<f32>> {
    (0..batch_size)
        .map(|b| {
            let mut sum = vec![0.0f32; hidden];
            let mut count = 0.0f32;
            for s in 0..out_seq_len.min(mask_seq_len) {
                if attention_mask[b * mask_seq_len + s] == 0 {
                    continue;
                }
                let offset = (b * out_seq_len + s) * hidden;
                for (acc, x) in sum.iter_mut().zip(&data[offset..offset + hidden]) {
                    *acc += x;
                }
                count += 1.0;
            }
            if count > 0.0 {
                sum.iter_mut().for_each(|x| *x /= count);
            }
            l2_normalize(&mut sum);
            sum
        })
        .collect()
}
