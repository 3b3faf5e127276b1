//! qbank-core
//!
//! Question corpus, shared data model and error taxonomy for the interview
//! question retrieval engine. Both ranking strategies (`qbank-text`,
//! `qbank-vector`) work against the `CorpusSnapshot` defined here.

pub mod config;
pub mod corpus;
pub mod error;
pub mod query;
pub mod traits;
pub mod types;

pub use corpus::{CorpusSnapshot, CorpusStore};
pub use error::{Error, Result};
pub use types::{Question, QuestionRecord, RankedQuestion, Requirements, SearchFilters, StrategyKind};
