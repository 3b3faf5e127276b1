use qbank_core::config::EmbeddingSettings;
use qbank_embed::get_default_embedder;

// Embed two strings with the configured backend and print the shape.
// Usage:
//   APP_MODEL_DIR=models/all-MiniLM-L6-v2 cargo run -p qbank-embed --example embed
//   APP_USE_FAKE_EMBEDDINGS=1 cargo run -p qbank-embed --example embed

fn main() -> anyhow::Result<()> {
    let embedder = get_default_embedder(&EmbeddingSettings::default())?;
    let texts = vec!["hello world".to_string(), "rust embeddings".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("model={} B={} dim={}", embedder.model_id(), embs.len(), embedder.dim());
    Ok(())
}
