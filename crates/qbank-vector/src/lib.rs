//! qbank-vector
//!
//! In-memory embedding index over the question corpus: explicit
//! build / query / clear phases, cosine distance, metadata filters.

pub mod index;
pub mod math;

pub use index::{EmbeddingIndex, IndexSnapshot};
