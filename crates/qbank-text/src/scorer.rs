use std::collections::BTreeSet;

use tracing::debug;

use qbank_core::corpus::CorpusSnapshot;
use qbank_core::error::{Error, Result};
use qbank_core::traits::Ranker;
use qbank_core::types::{Question, RankedQuestion, SearchFilters, StrategyKind};

const TEXT_WEIGHT: usize = 2;
const KEYWORD_WEIGHT: usize = 3;
const CATEGORY_BONUS: usize = 2;

/// Distinct lower-cased, whitespace-delimited query words.
pub fn tokenize_query(query: &str) -> BTreeSet<String> {
    query.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Keyword score of one question:
/// 2 per query word found in the question text, 3 per keyword found in the
/// query, and 2 if the category name appears in the query. All matches are
/// case-insensitive substring tests.
pub fn score_question(question: &Question, words: &BTreeSet<String>, query_lower: &str) -> usize {
    let text_lower = question.text.to_lowercase();
    let text_score = words.iter().filter(|w| text_lower.contains(w.as_str())).count() * TEXT_WEIGHT;
    let keyword_score = question
        .keywords
        .iter()
        .filter(|k| query_lower.contains(&k.to_lowercase()))
        .count()
        * KEYWORD_WEIGHT;
    let category_score = if query_lower.contains(&question.category.to_lowercase()) {
        CATEGORY_BONUS
    } else {
        0
    };
    text_score + keyword_score + category_score
}

/// Stateless; ranks whatever snapshot it is handed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalScorer;

impl LexicalScorer {
    pub fn new() -> Self {
        Self
    }

    /// Candidates with a non-zero score, best first, ties in corpus order.
    pub fn score_all<'a>(
        &self,
        corpus: &'a CorpusSnapshot,
        query: &str,
        filters: &SearchFilters,
    ) -> Vec<(&'a Question, usize)> {
        let words = tokenize_query(query);
        if words.is_empty() {
            return Vec::new();
        }
        let query_lower = query.to_lowercase();
        let mut scored: Vec<(&Question, usize)> = corpus
            .questions()
            .iter()
            .filter(|q| filters.matches_normalized(q))
            .map(|q| (q, score_question(q, &words, &query_lower)))
            .filter(|(_, score)| *score > 0)
            .collect();
        // Stable: equal scores keep corpus order.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
    }
}

impl Ranker for LexicalScorer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Lexical
    }

    fn rank(
        &self,
        corpus: &CorpusSnapshot,
        query: &str,
        k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<RankedQuestion>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        let scored = self.score_all(corpus, query, filters);
        debug!(
            generation = corpus.generation(),
            matched = scored.len(),
            k,
            "lexical ranking"
        );
        #[allow(clippy::cast_precision_loss)]
        let ranked = scored
            .into_iter()
            .take(k)
            .map(|(q, score)| RankedQuestion::from_question(q, score as f32))
            .collect();
        Ok(ranked)
    }
}
