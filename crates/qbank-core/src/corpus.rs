//! The corpus store: the single owner of the loaded question list.
//!
//! Readers take an `Arc<CorpusSnapshot>` and work against it without holding
//! any lock; `load` and `clear` build a complete new snapshot and swap it in,
//! so a partially loaded corpus is never observable.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{Question, QuestionRecord, SearchFilters, DEFAULT_CATEGORY, DEFAULT_DIFFICULTY};

/// One immutable corpus generation.
#[derive(Debug, Default)]
pub struct CorpusSnapshot {
    generation: u64,
    questions: Vec<Question>,
}

impl CorpusSnapshot {
    /// Bumped by every `load` and `clear`; derived indexes record the
    /// generation they were built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        let ordinal: usize = id.strip_prefix("q_")?.parse().ok()?;
        self.questions.get(ordinal).filter(|q| q.id == id)
    }
}

#[derive(Debug, Default)]
pub struct CorpusStore {
    current: RwLock<Arc<CorpusSnapshot>>,
}

impl CorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<CorpusSnapshot> {
        // A panicking writer cannot leave a half-swapped pointer behind.
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the whole corpus. Ids are reassigned from load order.
    pub fn load(&self, records: Vec<QuestionRecord>) -> Result<Arc<CorpusSnapshot>> {
        if records.is_empty() {
            return Err(Error::Validation("no questions to load".to_string()));
        }
        let questions = records
            .into_iter()
            .enumerate()
            .map(|(ordinal, record)| normalize_record(ordinal, record))
            .collect::<Result<Vec<_>>>()?;

        let snapshot = self.swap(questions);
        info!(
            total_questions = snapshot.len(),
            generation = snapshot.generation(),
            "corpus loaded"
        );
        Ok(snapshot)
    }

    /// Read a corpus file (`{"questions": [...]}` or a bare array) and load it.
    pub fn load_file(&self, path: &Path) -> Result<Arc<CorpusSnapshot>> {
        debug!(path = %path.display(), "reading corpus file");
        let raw = std::fs::read_to_string(path)?;
        let records = parse_corpus(&raw)?;
        self.load(records)
    }

    pub fn clear(&self) -> Arc<CorpusSnapshot> {
        let snapshot = self.swap(Vec::new());
        info!(generation = snapshot.generation(), "corpus cleared");
        snapshot
    }

    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn get(&self, id: &str) -> Result<Question> {
        self.snapshot()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("question '{id}'")))
    }

    /// Sorted, distinct categories present in the corpus.
    pub fn categories(&self) -> Vec<String> {
        let snapshot = self.snapshot();
        let set: BTreeSet<&str> = snapshot.questions().iter().map(|q| q.category.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Non-ranked listing in corpus order with case-insensitive filters.
    pub fn browse(&self, filters: &SearchFilters, limit: usize) -> Vec<Question> {
        self.snapshot()
            .questions()
            .iter()
            .filter(|q| filters.matches_normalized(q))
            .take(limit)
            .cloned()
            .collect()
    }

    fn swap(&self, questions: Vec<Question>) -> Arc<CorpusSnapshot> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let snapshot = Arc::new(CorpusSnapshot {
            generation: guard.generation + 1,
            questions,
        });
        *guard = Arc::clone(&snapshot);
        snapshot
    }
}

/// Parse the persisted corpus format.
pub fn parse_corpus(raw: &str) -> Result<Vec<QuestionRecord>> {
    match serde_json::from_str::<Value>(raw)? {
        value @ Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(mut map) => match map.remove("questions") {
            Some(questions) => Ok(serde_json::from_value(questions)?),
            None => Err(Error::Validation("corpus file has no `questions` array".to_string())),
        },
        _ => Err(Error::Validation("corpus file must be a JSON object or array".to_string())),
    }
}

fn normalize_record(ordinal: usize, record: QuestionRecord) -> Result<Question> {
    let text = record.text.trim();
    if text.is_empty() {
        return Err(Error::Validation(format!("question #{ordinal} has no text")));
    }
    Ok(Question {
        id: format!("q_{ordinal}"),
        ordinal,
        text: text.to_string(),
        category: non_blank_or(&record.category, DEFAULT_CATEGORY),
        difficulty: non_blank_or(&record.difficulty, DEFAULT_DIFFICULTY),
        // A blank keyword is a substring of every query; drop it.
        keywords: record
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        hints: record.hints,
    })
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() { fallback.to_string() } else { value.to_string() }
}
