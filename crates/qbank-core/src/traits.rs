use crate::corpus::CorpusSnapshot;
use crate::error::Result;
use crate::types::{RankedQuestion, SearchFilters, StrategyKind};

/// An embedding backend. Implementations must be deterministic for a given
/// model and return vectors of exactly `dim()` components.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the backend/model, reported by `stats`.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// One retrieval strategy. Ranking never mutates shared state, so callers
/// may run any number of `rank` calls in parallel against one snapshot.
pub trait Ranker: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Return at most `k` questions from `corpus`, best first.
    fn rank(
        &self,
        corpus: &CorpusSnapshot,
        query: &str,
        k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<RankedQuestion>>;
}
