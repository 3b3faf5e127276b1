use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or empty corpus input. Never partially applied.
    #[error("Invalid corpus: {0}")]
    Validation(String),

    /// An embedding failed while building the index; the previous index is kept.
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Embedding backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The embedding index was never built, or was built for an older corpus generation.
    #[error("Embedding index is not ready; build it after loading the corpus")]
    IndexNotReady,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed corpus file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
