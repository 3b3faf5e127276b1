//! qbank-embed
//!
//! Embedding backends for the question index: a local BERT-family sentence
//! encoder (all-MiniLM-L6-v2 by default) run through candle, and a
//! deterministic hash embedder for tests and low-memory development.

use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info};
use twox_hash::XxHash64;

use qbank_core::config::{expand_path, EmbeddingSettings};
use qbank_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

/// Sentence encoder with mean pooling over a BERT-style model directory
/// containing `tokenizer.json`, `config.json` and `pytorch_model.bin`.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
    dim: usize,
    max_len: usize,
    pad_id: u32,
}

impl BertEmbedder {
    pub fn load(model_dir: &Path, settings: &EmbeddingSettings) -> Result<Self> {
        let device = select_device();
        info!(model = %settings.model, dir = %model_dir.display(), "loading sentence encoder");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path)?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);
        info!(model = %settings.model, dim = settings.dim, "sentence encoder ready");
        Ok(Self {
            model,
            tokenizer,
            device,
            id: format!("local:{}:d{}", settings.model, settings.dim),
            dim: settings.dim,
            max_len: settings.max_len,
            pad_id,
        })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) =
            tokenize_on_device(&self.tokenizer, text, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        if emb.len() != self.dim {
            bail!("model produced {} dimensions, configured for {}", emb.len(), self.dim);
        }
        if start.elapsed().as_millis() > 100 {
            debug!(elapsed_ms = start.elapsed().as_millis(), "slow embedding");
        }
        Ok(emb)
    }
}

impl Embedder for BertEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

/// Deterministic bag-of-tokens embedder. Each lower-cased token hashes to one
/// dimension, so texts sharing words get a positive cosine similarity and word
/// order does not matter. Output is L2-normalized; an empty text yields the
/// zero vector.
pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            bail!("hash embedder needs at least one dimension");
        }
        Ok(Self { dim, id: format!("hash:xxh64:d{dim}") })
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let tokens = text
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|t| !t.is_empty());
        for token in tokens {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            let (idx, val) = ((h as usize) % self.dim, ((h >> 32) as u32) as f32 / u32::MAX as f32);
            v[idx] += val;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Fake embeddings are selected by `embedding.use_fake` or by
/// `APP_USE_FAKE_EMBEDDINGS=1`; otherwise the local model is loaded.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let env_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if settings.use_fake || env_fake {
        info!(dim = settings.dim, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(settings.dim)?));
    }
    let model_dir = resolve_model_dir(settings)?;
    Ok(Box::new(BertEmbedder::load(&model_dir, settings)?))
}

fn resolve_model_dir(settings: &EmbeddingSettings) -> Result<PathBuf> {
    if let Some(dir) = settings.model_dir.as_deref() {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        bail!("Configured embedding.model_dir {} does not exist", p.display());
    }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = expand_path(&dir);
            if p.exists() { debug!(var, dir = %p.display(), "model dir from env"); return Ok(p); }
        }
    }
    for root in ["models", "../models"] {
        let p = Path::new(root).join(&settings.model);
        if p.exists() { debug!(dir = %p.display(), "model dir"); return Ok(p); }
    }
    Err(anyhow!("Could not locate model directory for {}", settings.model))
}
