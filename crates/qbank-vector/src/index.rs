use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use qbank_core::corpus::CorpusSnapshot;
use qbank_core::error::{Error, Result};
use qbank_core::traits::{Embedder, Ranker};
use qbank_core::types::{QuestionId, RankedQuestion, SearchFilters, StrategyKind};

use crate::math::{cosine_distance, is_finite, l2_normalize};

const DEFAULT_BATCH_SIZE: usize = 32;

/// Vectors for one corpus generation, in corpus order.
#[derive(Debug)]
pub struct IndexSnapshot {
    generation: u64,
    vectors: Vec<Vec<f32>>,
    slots: HashMap<QuestionId, usize>,
}

impl IndexSnapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vector(&self, id: &str) -> Option<&[f32]> {
        self.slots.get(id).map(|&slot| self.vectors[slot].as_slice())
    }
}

/// Exact cosine nearest-neighbour index over the question corpus.
///
/// `build` embeds every question into a fresh snapshot and swaps it in only
/// on success, so a failed build leaves the previous index untouched. A
/// snapshot only serves queries against the corpus generation it was built
/// from; anything else is `IndexNotReady`.
pub struct EmbeddingIndex {
    embedder: Box<dyn Embedder>,
    batch_size: usize,
    show_progress: bool,
    current: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl EmbeddingIndex {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self {
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            show_progress: false,
            current: RwLock::new(None),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of indexed documents; 0 when never built or cleared.
    pub fn document_count(&self) -> usize {
        self.snapshot().map_or(0, |s| s.len())
    }

    pub fn is_ready_for(&self, corpus: &CorpusSnapshot) -> bool {
        self.snapshot().is_some_and(|s| s.generation == corpus.generation())
    }

    /// Embed the whole corpus and replace the current index.
    pub fn build(&self, corpus: &CorpusSnapshot) -> Result<usize> {
        let questions = corpus.questions();
        let dim = self.embedder.dim();
        info!(
            documents = questions.len(),
            generation = corpus.generation(),
            model = self.embedder.model_id(),
            "building embedding index"
        );

        let pb = if self.show_progress { ProgressBar::new(questions.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} questions ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut vectors = Vec::with_capacity(questions.len());
        for batch in questions.chunks(self.batch_size) {
            let docs: Vec<String> = batch.iter().map(|q| q.embedding_document()).collect();
            let embeddings = self
                .embedder
                .embed_batch(&docs)
                .map_err(|e| Error::IndexBuild(format!("embedding {}: {e:#}", batch[0].id)))?;
            if embeddings.len() != batch.len() {
                return Err(Error::IndexBuild(format!(
                    "backend returned {} vectors for {} documents",
                    embeddings.len(),
                    batch.len()
                )));
            }
            for (question, mut vector) in batch.iter().zip(embeddings) {
                if vector.len() != dim || !is_finite(&vector) {
                    return Err(Error::IndexBuild(format!(
                        "invalid vector for {} (len {}, expected {dim})",
                        question.id,
                        vector.len()
                    )));
                }
                l2_normalize(&mut vector);
                vectors.push(vector);
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();

        assert_eq!(vectors.len(), questions.len(), "index must cover the whole corpus");
        let slots = questions.iter().enumerate().map(|(slot, q)| (q.id.clone(), slot)).collect();
        let snapshot = Arc::new(IndexSnapshot { generation: corpus.generation(), vectors, slots });
        let count = snapshot.len();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        info!(documents = count, generation = corpus.generation(), "embedding index ready");
        Ok(count)
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("embedding index cleared");
    }

    /// Up to `k` `(ordinal, distance)` pairs, nearest first; equal distances
    /// keep corpus order.
    pub fn nearest(
        &self,
        corpus: &CorpusSnapshot,
        text: &str,
        k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<(usize, f32)>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        let index = self
            .snapshot()
            .filter(|s| s.generation == corpus.generation())
            .ok_or(Error::IndexNotReady)?;
        assert_eq!(index.len(), corpus.len(), "index diverged from its corpus generation");

        let mut query = self.embedder.embed(text).map_err(|e| Error::Embedding(format!("{e:#}")))?;
        if query.len() != self.embedder.dim() || !is_finite(&query) {
            return Err(Error::Embedding(format!(
                "query vector has {} dimensions, expected {}",
                query.len(),
                self.embedder.dim()
            )));
        }
        l2_normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = corpus
            .questions()
            .iter()
            .zip(&index.vectors)
            .filter(|(q, _)| filters.matches_exact(q))
            .map(|(q, v)| (q.ordinal, cosine_distance(&query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        debug!(generation = index.generation, candidates = scored.len(), k, "vector ranking");
        Ok(scored)
    }
}

impl Ranker for EmbeddingIndex {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Embedding
    }

    fn rank(
        &self,
        corpus: &CorpusSnapshot,
        query: &str,
        k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<RankedQuestion>> {
        let hits = self.nearest(corpus, query, k, filters)?;
        Ok(hits
            .into_iter()
            .map(|(ordinal, distance)| RankedQuestion::from_question(&corpus.questions()[ordinal], 1.0 - distance))
            .collect())
    }
}
