//! In-process sentence encoder run with Candle.
//!
//! Loads a BERT sentence-transformers model (all-MiniLM-L6-v2 by default),
//! runs the forward pass on CPU and mean-pools token embeddings over the
//! attention mask.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::model_cache::{ModelCache, ModelPaths};
use crate::embeddings::EmbeddingProvider;
use crate::vector::normalize_in_place;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use peerconnect_core::{AppError, AppResult};
use tokenizers::Tokenizer;
use tracing::{debug, info, instrument};

/// Tokens beyond this are dropped
pub const MAX_SEQ_LENGTH: usize = 256;

/// Local Candle encoder.
pub struct LocalEncoderProvider {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_name: String,
    dimensions: usize,
    batch_size: usize,
}

impl std::fmt::Debug for LocalEncoderProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEncoderProvider")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

fn candle_err(e: candle_core::Error) -> AppError {
    AppError::Embedding(format!("Encoder error: {}", e))
}

impl LocalEncoderProvider {
    /// Load the encoder named by `config.model`, downloading it if not cached.
    pub fn load(config: &EmbeddingConfig) -> AppResult<Self> {
        let cache = match &config.cache_dir {
            Some(dir) => ModelCache::new(dir, &config.model),
            None => ModelCache::in_user_cache(&config.model),
        };
        let paths = cache.get_or_download()?;
        Self::load_from_paths(&config.model, &paths, config.batch_size)
    }

    /// Load from explicit model files.
    pub fn load_from_paths(model_name: &str, paths: &ModelPaths, batch_size: usize) -> AppResult<Self> {
        info!(model = model_name, "Loading local encoder");
        let device = Device::Cpu;

        let config_str = std::fs::read_to_string(&paths.config)?;
        let bert_config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| AppError::Embedding(format!("Invalid encoder config: {}", e)))?;
        let dimensions = serde_json::from_str::<serde_json::Value>(&config_str)?
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| AppError::Embedding("Encoder config has no hidden_size".to_string()))?
            as usize;

        let tokenizer = Tokenizer::from_file(&paths.tokenizer)
            .map_err(|e| AppError::Embedding(format!("Failed to load tokenizer: {}", e)))?;

        // SAFETY: the weights file is owned by the model cache and not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[paths.weights.clone()], DType::F32, &device)
                .map_err(candle_err)?
        };
        let model = BertModel::load(vb, &bert_config).map_err(candle_err)?;

        info!(
            dim = dimensions,
            max_seq = MAX_SEQ_LENGTH,
            "Local encoder ready"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            model_name: model_name.to_string(),
            dimensions,
            batch_size: batch_size.max(1),
        })
    }

    fn encode(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| AppError::Embedding(format!("Tokenization failed: {}", e)))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(MAX_SEQ_LENGTH);

        let mut ids_flat = Vec::with_capacity(texts.len() * seq_len);
        let mut mask_flat = Vec::with_capacity(texts.len() * seq_len);
        for encoding in &encodings {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let len = ids.len().min(seq_len);

            ids_flat.extend_from_slice(&ids[..len]);
            ids_flat.extend(std::iter::repeat(0).take(seq_len - len));
            mask_flat.extend_from_slice(&mask[..len]);
            mask_flat.extend(std::iter::repeat(0).take(seq_len - len));
        }

        let shape = (texts.len(), seq_len);
        let input_ids = Tensor::from_vec(ids_flat, shape, &self.device).map_err(candle_err)?;
        let attention_mask = Tensor::from_vec(mask_flat, shape, &self.device).map_err(candle_err)?;
        let token_type_ids = input_ids.zeros_like().map_err(candle_err)?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(candle_err)?;

        let pooled = mean_pooling(&output, &attention_mask).map_err(candle_err)?;
        let mut vectors: Vec<Vec<f32>> = pooled.to_vec2().map_err(candle_err)?;
        for vector in &mut vectors {
            normalize_in_place(vector);
        }

        Ok(vectors)
    }
}

/// Average token embeddings, ignoring padding positions.
fn mean_pooling(embeddings: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask
        .unsqueeze(2)?
        .broadcast_as(embeddings.shape())?
        .to_dtype(DType::F32)?;

    let summed = embeddings.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
    summed.broadcast_div(&counts)
}

#[async_trait::async_trait]
impl EmbeddingProvider for LocalEncoderProvider {
    fn provider_name(&self) -> &str {
        "local"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), provider = "local"))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.encode(batch)?);
        }
        debug!(count = vectors.len(), dim = self.dimensions, "Batch encoded");
        Ok(vectors)
    }
}
