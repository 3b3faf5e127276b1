//! qbank-hybrid
//!
//! The retrieval facade: owns the corpus, picks one ranking strategy at
//! construction time and exposes `search` plus corpus lifecycle calls.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use qbank_core::config::{EmbeddingSettings, Settings};
use qbank_core::corpus::{CorpusSnapshot, CorpusStore};
use qbank_core::error::{Error, Result};
use qbank_core::query::{build_query, relevant_categories};
use qbank_core::traits::{Embedder, Ranker};
use qbank_core::types::{Question, QuestionRecord, RankedQuestion, Requirements, SearchFilters, StrategyKind};
use qbank_embed::get_default_embedder;
use qbank_text::LexicalScorer;
use qbank_vector::EmbeddingIndex;

/// The ranking strategy, fixed for the lifetime of a `Retriever`.
pub enum Strategy {
    Embedding(EmbeddingIndex),
    Lexical(LexicalScorer),
}

impl Strategy {
    fn ranker(&self) -> &dyn Ranker {
        match self {
            Self::Embedding(index) => index,
            Self::Lexical(scorer) => scorer,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        self.ranker().kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_questions: usize,
    pub strategy: StrategyKind,
    pub embedding_model: Option<String>,
    pub indexed_documents: usize,
}

/// Search results for a requirements record, with the query that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementsMatch {
    pub query: String,
    pub suggested_categories: Vec<String>,
    pub questions: Vec<RankedQuestion>,
}

/// Load, clear and index builds take the gate exclusively; searches share it,
/// so a search never sees a corpus and an index from different generations.
pub struct Retriever {
    corpus: CorpusStore,
    strategy: Strategy,
    gate: RwLock<()>,
}

impl Retriever {
    pub fn new(strategy: Strategy) -> Self {
        info!(strategy = strategy.kind().as_str(), "retriever ready");
        Self { corpus: CorpusStore::new(), strategy, gate: RwLock::new(()) }
    }

    pub fn lexical() -> Self {
        Self::new(Strategy::Lexical(LexicalScorer::new()))
    }

    pub fn with_embedder(embedder: Box<dyn Embedder>) -> Self {
        Self::new(Strategy::Embedding(EmbeddingIndex::new(embedder)))
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::from_settings_with(settings, get_default_embedder)
    }

    /// As `from_settings`, with the embedding backend supplied by `load_embedder`.
    pub fn from_settings_with<F>(settings: &Settings, load_embedder: F) -> Result<Self>
    where
        F: FnOnce(&EmbeddingSettings) -> anyhow::Result<Box<dyn Embedder>>,
    {
        settings.validate()?;
        if !settings.retrieval.use_embeddings {
            return Ok(Self::lexical());
        }
        match load_embedder(&settings.embedding) {
            Ok(embedder) => {
                let index = EmbeddingIndex::new(embedder)
                    .with_batch_size(settings.embedding.batch_size)
                    .with_progress(settings.embedding.show_progress);
                Ok(Self::new(Strategy::Embedding(index)))
            }
            Err(e) if settings.retrieval.allow_fallback => {
                warn!(error = %format!("{e:#}"), "embedding backend unavailable, using lexical scoring");
                Ok(Self::lexical())
            }
            Err(e) => Err(Error::BackendUnavailable(format!("{e:#}"))),
        }
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// The current corpus generation.
    pub fn snapshot(&self) -> Arc<CorpusSnapshot> {
        self.corpus.snapshot()
    }

    pub fn get(&self, id: &str) -> Result<Question> {
        self.corpus.get(id)
    }

    pub fn categories(&self) -> Vec<String> {
        self.corpus.categories()
    }

    /// Unranked listing in corpus order; filters are case-insensitive.
    pub fn browse(&self, filters: &SearchFilters, limit: usize) -> Vec<Question> {
        self.corpus.browse(filters, limit)
    }

    /// Replace the corpus. In embedding mode the index must be rebuilt
    /// before the next search.
    pub fn load(&self, records: Vec<QuestionRecord>) -> Result<usize> {
        let _gate = self.write_gate();
        Ok(self.corpus.load(records)?.len())
    }

    pub fn load_file(&self, path: &Path) -> Result<usize> {
        let _gate = self.write_gate();
        Ok(self.corpus.load_file(path)?.len())
    }

    pub fn clear(&self) {
        let _gate = self.write_gate();
        self.clear_locked();
    }

    /// Embed the current corpus. A no-op in lexical mode.
    pub fn build_index(&self) -> Result<usize> {
        let _gate = self.write_gate();
        self.build_locked()
    }

    /// Load and index in one step.
    pub fn reload(&self, records: Vec<QuestionRecord>) -> Result<usize> {
        let _gate = self.write_gate();
        self.corpus.load(records)?;
        self.build_locked()
    }

    /// Populate from `path` when the corpus is empty or `force_reload` is set.
    /// An already loaded corpus is kept and indexed if it is not yet.
    /// A missing file leaves the corpus empty.
    pub fn initialize(&self, path: &Path, force_reload: bool) -> Result<usize> {
        let _gate = self.write_gate();
        let snapshot = self.corpus.snapshot();
        if !snapshot.is_empty() && !force_reload {
            if let Strategy::Embedding(index) = &self.strategy {
                if !index.is_ready_for(&snapshot) {
                    return index.build(&snapshot);
                }
            }
            return Ok(snapshot.len());
        }
        if force_reload {
            self.clear_locked();
        }
        if !path.exists() {
            warn!(path = %path.display(), "questions file not found; corpus left empty");
            return Ok(0);
        }
        self.corpus.load_file(path)?;
        self.build_locked()
    }

    pub fn count(&self) -> usize {
        self.corpus.count()
    }

    pub fn search(
        &self,
        query: &str,
        k: usize,
        category: Option<&str>,
        difficulty: Option<&str>,
    ) -> Result<Vec<RankedQuestion>> {
        let filters = SearchFilters::new(category.map(str::to_string), difficulty.map(str::to_string));
        self.search_with(query, k, &filters)
    }

    pub fn search_with(&self, query: &str, k: usize, filters: &SearchFilters) -> Result<Vec<RankedQuestion>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        let _gate = self.read_gate();
        let snapshot = self.corpus.snapshot();
        let k = k.min(snapshot.len().max(1));
        let results = self.strategy.ranker().rank(&snapshot, query, k, filters)?;
        debug!(
            strategy = self.strategy.kind().as_str(),
            generation = snapshot.generation(),
            filtered = !filters.is_empty(),
            returned = results.len(),
            "search"
        );
        Ok(results)
    }

    /// Build the query from `requirements`, then search.
    pub fn search_requirements(
        &self,
        requirements: &Requirements,
        k: usize,
        filters: &SearchFilters,
    ) -> Result<RequirementsMatch> {
        let query = build_query(requirements);
        let questions = self.search_with(&query, k, filters)?;
        Ok(RequirementsMatch { query, suggested_categories: relevant_categories(requirements), questions })
    }

    pub fn stats(&self) -> Stats {
        let _gate = self.read_gate();
        let (embedding_model, indexed_documents) = match &self.strategy {
            Strategy::Embedding(index) => (Some(index.embedder().model_id().to_string()), index.document_count()),
            Strategy::Lexical(_) => (None, 0),
        };
        Stats {
            total_questions: self.corpus.count(),
            strategy: self.strategy.kind(),
            embedding_model,
            indexed_documents,
        }
    }

    fn clear_locked(&self) {
        self.corpus.clear();
        if let Strategy::Embedding(index) = &self.strategy {
            index.clear();
        }
    }

    fn build_locked(&self) -> Result<usize> {
        let snapshot = self.corpus.snapshot();
        match &self.strategy {
            Strategy::Embedding(index) => index.build(&snapshot),
            Strategy::Lexical(_) => Ok(snapshot.len()),
        }
    }

    fn read_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().unwrap_or_else(PoisonError::into_inner)
    }
}
