//! qbank-text
//!
//! Deterministic keyword scoring over the in-memory corpus. Used when no
//! embedding backend is configured or the backend could not be started.

pub mod scorer;

pub use scorer::{score_question, tokenize_query, LexicalScorer};
