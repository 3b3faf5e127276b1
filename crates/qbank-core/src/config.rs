//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`APP_RETRIEVAL__USE_EMBEDDINGS=true` sets
//! `retrieval.use_embeddings`). Provides helpers to expand `~` and `${VAR}`
//! and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Self::from_figment(figment, env_name)
    }

    /// Wrap an already assembled figment; used by tests and embedding callers.
    pub fn from_figment(figment: Figment, env_name: &str) -> anyhow::Result<Self> {
        let config = Self { figment, env_name: env_name.to_string() };
        config.settings()?.validate_for_env(env_name)?;
        Ok(config)
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSettings {
    pub path: String,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self { path: "data/interview_questions.json".to_string() }
    }
}

impl CorpusSettings {
    pub fn resolved_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Embedding strategy when true; lexical scoring otherwise. Off by
    /// default so low-memory hosts never load a model.
    pub use_embeddings: bool,
    /// Fall back to lexical scoring when the embedding backend cannot start.
    pub allow_fallback: bool,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { use_embeddings: false, allow_fallback: true, default_limit: 10, max_limit: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub model: String,
    pub model_dir: Option<String>,
    pub dim: usize,
    pub max_len: usize,
    pub batch_size: usize,
    pub use_fake: bool,
    pub show_progress: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            model_dir: None,
            dim: 384,
            max_len: 256,
            batch_size: 32,
            use_fake: false,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    pub categories: Vec<String>,
    pub difficulties: Vec<String>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        let categories = [
            "Python",
            "Data Structures & Algorithms",
            "System Design",
            "Machine Learning",
            "Deep Learning",
            "NLP",
            "Computer Vision",
            "SQL & Databases",
            "Cloud Computing",
            "DevOps",
            "Behavioral",
            "General Software Engineering",
        ];
        Self {
            categories: categories.iter().map(|s| s.to_string()).collect(),
            difficulties: ["Easy", "Medium", "Hard"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Checks that hold in every environment.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));
        if self.retrieval.default_limit == 0 {
            return invalid("retrieval.default_limit must be at least 1");
        }
        if self.retrieval.max_limit < self.retrieval.default_limit {
            return invalid("retrieval.max_limit must not be below retrieval.default_limit");
        }
        if self.embedding.dim == 0 {
            return invalid("embedding.dim must be at least 1");
        }
        if self.embedding.batch_size == 0 {
            return invalid("embedding.batch_size must be at least 1");
        }
        Ok(())
    }

    pub fn validate_for_env(&self, env: &str) -> Result<(), Error> {
        self.validate()?;
        if matches!(env, "prod" | "production") && self.embedding.use_fake {
            return Err(Error::InvalidConfig("embedding.use_fake is not allowed in production".to_string()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
