use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use qbank_core::config::{Config, Settings};
use qbank_core::types::{Requirements, SearchFilters};
use qbank_hybrid::Retriever;

/// Interview question retrieval over a local question bank.
#[derive(Parser, Debug)]
#[command(name = "qbank")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Corpus file; overrides `corpus.path`
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Rank with the embedding index
    #[arg(long, global = true, conflicts_with = "lexical")]
    embeddings: bool,

    /// Rank with keyword scoring
    #[arg(long, global = true)]
    lexical: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank questions against free text
    Search {
        query: String,
        #[arg(short)]
        k: Option<usize>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
    },
    /// Build a query from a requirements JSON file and search with it
    Match {
        requirements: PathBuf,
        #[arg(short)]
        k: Option<usize>,
    },
    /// Print one question by id
    Show { id: String },
    /// List the corpus categories
    Categories,
    /// List questions in corpus order
    Browse {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Corpus and index statistics
    Stats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn limit(settings: &Settings, k: Option<usize>) -> usize {
    k.unwrap_or(settings.retrieval.default_limit).min(settings.retrieval.max_limit)
}

/// Filter values outside the configured catalog are logged, not rejected.
fn check_filters(settings: &Settings, category: Option<&str>, difficulty: Option<&str>) {
    let known = |list: &[String], value: &str| list.iter().any(|v| v.eq_ignore_ascii_case(value));
    if let Some(category) = category.filter(|c| !known(&settings.catalog.categories, c)) {
        warn!(category, "category is not in the configured catalog");
    }
    if let Some(difficulty) = difficulty.filter(|d| !known(&settings.catalog.difficulties, d)) {
        warn!(difficulty, "difficulty is not in the configured catalog");
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;
    let mut settings = config.settings()?;
    if cli.embeddings {
        settings.retrieval.use_embeddings = true;
    } else if cli.lexical {
        settings.retrieval.use_embeddings = false;
    }

    let corpus_path = match cli.corpus {
        Some(path) => path,
        None => settings.corpus.resolved_path(&std::env::current_dir()?),
    };
    let retriever = Retriever::from_settings(&settings)?;
    let loaded = retriever
        .initialize(&corpus_path, false)
        .with_context(|| format!("loading {}", corpus_path.display()))?;
    info!(questions = loaded, env = config.env_name(), strategy = retriever.strategy_kind().as_str(), "ready");

    match cli.command {
        Command::Search { query, k, category, difficulty } => {
            check_filters(&settings, category.as_deref(), difficulty.as_deref());
            let results = retriever.search(&query, limit(&settings, k), category.as_deref(), difficulty.as_deref())?;
            print_json(&results)
        }
        Command::Match { requirements, k } => {
            let raw = std::fs::read_to_string(&requirements)
                .with_context(|| format!("reading {}", requirements.display()))?;
            let requirements: Requirements = serde_json::from_str(&raw)?;
            let matched = retriever.search_requirements(&requirements, limit(&settings, k), &SearchFilters::default())?;
            print_json(&matched)
        }
        Command::Show { id } => print_json(&retriever.get(&id)?),
        Command::Categories => print_json(&retriever.categories()),
        Command::Browse { category, difficulty, limit } => {
            check_filters(&settings, category.as_deref(), difficulty.as_deref());
            let filters = SearchFilters::new(category, difficulty);
            print_json(&retriever.browse(&filters, limit))
        }
        Command::Stats => print_json(&retriever.stats()),
    }
}
