//! Domain types shared by the corpus store and both retrieval strategies.

use serde::{Deserialize, Deserializer, Serialize};

pub type QuestionId = String;

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_DIFFICULTY: &str = "Medium";

/// A question as it arrives from the corpus source, before ids are assigned.
///
/// Field names follow the persisted corpus file: `question` and
/// `answer_hints`, with `text` and `hints` accepted as aliases. Hints may be
/// a list or a single string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "question", alias = "text", default)]
    pub text: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(rename = "answer_hints", alias = "hints", default, deserialize_with = "one_or_many")]
    pub hints: Vec<String>,
}

impl QuestionRecord {
    pub fn new(text: impl Into<String>, category: impl Into<String>, difficulty: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            difficulty: difficulty.into(),
            keywords: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints = hints.into_iter().map(Into::into).collect();
        self
    }
}

/// An immutable corpus entry.
///
/// - `id`: `q_<ordinal>`, unique within one corpus generation
/// - `ordinal`: position in load order, used as the tie-breaker by both strategies
/// - `keywords`: feed both the embedding document and the lexical score
/// - `hints`: passed through to callers, never scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub ordinal: usize,
    pub text: String,
    pub category: String,
    pub difficulty: String,
    pub keywords: Vec<String>,
    pub hints: Vec<String>,
}

impl Question {
    /// Text handed to the embedding backend: the question followed by its keywords.
    pub fn embedding_document(&self) -> String {
        format!("{} {}", self.text, self.keywords.join(" "))
    }
}

/// Metadata filters applied before ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

impl SearchFilters {
    pub fn new(category: Option<String>, difficulty: Option<String>) -> Self {
        Self { category, difficulty }
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self { category: Some(category.into()), difficulty: None }
    }

    pub fn difficulty(difficulty: impl Into<String>) -> Self {
        Self { category: None, difficulty: Some(difficulty.into()) }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.difficulty.is_none()
    }

    /// Exact, case-sensitive match. Used against embedding metadata.
    pub fn matches_exact(&self, question: &Question) -> bool {
        self.category.as_deref().map_or(true, |c| question.category == c)
            && self.difficulty.as_deref().map_or(true, |d| question.difficulty == d)
    }

    /// Match on lower-cased values. Used by the lexical scorer and corpus browsing.
    pub fn matches_normalized(&self, question: &Question) -> bool {
        self.category
            .as_deref()
            .map_or(true, |c| question.category.to_lowercase() == c.to_lowercase())
            && self
                .difficulty
                .as_deref()
                .map_or(true, |d| question.difficulty.to_lowercase() == d.to_lowercase())
    }
}

/// Indicates which strategy produced a result set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Embedding,
    Lexical,
}

impl StrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::Lexical => "lexical",
        }
    }
}

/// The output contract shared by both strategies.
///
/// `relevance_score` is higher-is-better and only comparable within one
/// result set: cosine similarity for the embedding strategy, the raw integer
/// keyword score for the lexical one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedQuestion {
    pub id: QuestionId,
    pub question: String,
    pub category: String,
    pub difficulty: String,
    pub hints: Vec<String>,
    pub keywords: Vec<String>,
    pub relevance_score: f32,
}

impl RankedQuestion {
    pub fn from_question(question: &Question, relevance_score: f32) -> Self {
        Self {
            id: question.id.clone(),
            question: question.text.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty.clone(),
            hints: question.hints.clone(),
            keywords: question.keywords.clone(),
            relevance_score,
        }
    }
}

/// Job requirements produced by the upstream job-description parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub job_role: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub interview_focus_areas: Vec<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_difficulty() -> String {
    DEFAULT_DIFFICULTY.to_string()
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) if s.trim().is_empty() => Vec::new(),
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}
