use std::collections::HashSet;
use std::io::Write;

use qbank_core::config::Settings;
use qbank_core::error::Error;
use qbank_core::traits::Embedder;
use qbank_core::types::{QuestionRecord, Requirements, SearchFilters, StrategyKind};
use qbank_embed::HashEmbedder;
use qbank_hybrid::{Retriever, Stats};

fn three_categories() -> Vec<QuestionRecord> {
    vec![
        QuestionRecord::new("How does the Python GIL affect threads?", "Python", "Medium")
            .with_keywords(["gil", "threads"]),
        QuestionRecord::new("What is a LEFT JOIN?", "SQL", "Easy").with_keywords(["join"]),
        QuestionRecord::new("Describe a time you disagreed with a manager", "Behavioral", "Easy")
            .with_hints(["situation", "outcome"]),
    ]
}

fn embedding_retriever() -> Retriever {
    Retriever::with_embedder(Box::new(HashEmbedder::new(256).expect("embedder")))
}

#[test]
fn lexical_python_query_returns_python_question_first() {
    let retriever = Retriever::lexical();
    assert_eq!(retriever.load(three_categories()).expect("load"), 3);

    let results = retriever.search("python experience", 5, None, None).expect("search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "q_0");
    assert_eq!(results[0].category, "Python");
    assert!(results[0].relevance_score > 0.0);
}

#[test]
fn loading_an_empty_corpus_is_a_validation_error() {
    let retriever = Retriever::lexical();
    assert!(matches!(retriever.load(Vec::new()), Err(Error::Validation(_))));
    assert_eq!(retriever.count(), 0);
}

#[test]
fn empty_lexical_query_returns_nothing() {
    let retriever = Retriever::lexical();
    retriever.load(three_categories()).expect("load");
    assert!(retriever.search("", 5, None, None).expect("search").is_empty());
}

#[test]
fn embedding_search_before_build_is_not_ready() {
    let retriever = embedding_retriever();
    retriever.load(three_categories()).expect("load");
    assert!(matches!(retriever.search("python", 3, None, None), Err(Error::IndexNotReady)));
}

#[test]
fn clear_empties_corpus_and_invalidates_index() {
    let retriever = embedding_retriever();
    retriever.reload(three_categories()).expect("reload");
    assert!(retriever.search("python", 3, None, None).is_ok());

    retriever.clear();
    assert_eq!(retriever.count(), 0);
    assert!(matches!(retriever.search("python", 3, None, None), Err(Error::IndexNotReady)));

    retriever.load(three_categories()).expect("load");
    assert!(matches!(retriever.search("python", 3, None, None), Err(Error::IndexNotReady)));
    assert_eq!(retriever.build_index().expect("build"), 3);
    assert!(retriever.search("python", 3, None, None).is_ok());
}

#[test]
fn building_an_empty_corpus_serves_empty_results() {
    let retriever = embedding_retriever();
    retriever.reload(three_categories()).expect("reload");
    retriever.clear();

    assert_eq!(retriever.build_index().expect("build"), 0);
    let stats = retriever.stats();
    assert_eq!(stats.indexed_documents, 0);
    assert_eq!(stats.total_questions, retriever.count());
    assert_eq!(retriever.count(), 0);
    assert!(retriever.search("python", 3, None, None).expect("search").is_empty());
}

#[test]
fn results_are_bounded_unique_and_filtered() {
    for retriever in [Retriever::lexical(), embedding_retriever()] {
        retriever.reload(three_categories()).expect("reload");

        let results = retriever.search("python join time a", 10, None, None).expect("search");
        assert!(results.len() <= retriever.count());
        let ids: HashSet<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), results.len(), "duplicate ids from {:?}", retriever.strategy_kind());

        let filtered = retriever.search("python join time a", 10, Some("SQL"), Some("Easy")).expect("search");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "q_1");

        let capped = retriever.search("python join time a", 1, None, None).expect("search");
        assert!(capped.len() <= 1);
    }
}

#[test]
fn zero_k_is_rejected_in_both_modes() {
    for retriever in [Retriever::lexical(), embedding_retriever()] {
        retriever.reload(three_categories()).expect("reload");
        assert!(matches!(retriever.search("python", 0, None, None), Err(Error::InvalidArgument(_))));
    }
}

#[test]
fn repeated_searches_are_identical() {
    let retriever = embedding_retriever();
    retriever.reload(three_categories()).expect("reload");
    let a = retriever.search("manager disagreement", 3, None, None).expect("search");
    let b = retriever.search("manager disagreement", 3, None, None).expect("search");
    assert_eq!(a, b);
    assert_eq!(a.len(), 3);
    for pair in a.windows(2) {
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }
}

#[test]
fn fallback_to_lexical_when_backend_fails() {
    let mut settings = Settings::default();
    settings.retrieval.use_embeddings = true;

    let retriever = Retriever::from_settings_with(&settings, |_| anyhow::bail!("no weights")).expect("fallback");
    assert_eq!(retriever.strategy_kind(), StrategyKind::Lexical);

    settings.retrieval.allow_fallback = false;
    let err = Retriever::from_settings_with(&settings, |_| anyhow::bail!("no weights")).err();
    assert!(matches!(err, Some(Error::BackendUnavailable(_))));

    let ok = Retriever::from_settings_with(&settings, |s| Ok(Box::new(HashEmbedder::new(s.dim)?) as Box<dyn Embedder>))
        .expect("embedding");
    assert_eq!(ok.strategy_kind(), StrategyKind::Embedding);
}

#[test]
fn lexical_is_the_default_strategy() {
    let retriever = Retriever::from_settings(&Settings::default()).expect("retriever");
    assert_eq!(retriever.strategy_kind(), StrategyKind::Lexical);
}

#[test]
fn fake_embeddings_from_settings() {
    let mut settings = Settings::default();
    settings.retrieval.use_embeddings = true;
    settings.embedding.use_fake = true;
    settings.embedding.dim = 64;
    let retriever = Retriever::from_settings(&settings).expect("retriever");
    assert_eq!(retriever.strategy_kind(), StrategyKind::Embedding);
    assert_eq!(retriever.stats().embedding_model.as_deref(), Some("hash:xxh64:d64"));
}

#[test]
fn concurrent_searches_see_a_consistent_generation() {
    let retriever = embedding_retriever();
    retriever.reload(three_categories()).expect("reload");
    let bigger: Vec<QuestionRecord> = three_categories()
        .into_iter()
        .chain([QuestionRecord::new("Design a URL shortener", "System Design", "Hard")])
        .collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let results = retriever.search("python threads", 10, None, None).expect("search");
                    assert!(results.len() == 3 || results.len() == 4);
                }
            });
        }
        scope.spawn(|| {
            for i in 0..20 {
                let records = if i % 2 == 0 { bigger.clone() } else { three_categories() };
                retriever.reload(records).expect("reload");
            }
        });
    });
    assert_eq!(retriever.stats().indexed_documents, retriever.count());
}

#[test]
fn initialize_loads_file_once_unless_forced() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    let body = serde_json::json!({
        "questions": [
            {"question": "Explain Kubernetes pods", "category": "DevOps", "difficulty": "Medium",
             "keywords": ["kubernetes"], "answer_hints": "containers share a network namespace"},
            {"question": "What is a Python generator?", "category": "Python"}
        ]
    });
    write!(file, "{body}").expect("write");

    let retriever = embedding_retriever();
    assert_eq!(retriever.initialize(file.path(), false).expect("init"), 2);
    let first = retriever.snapshot().generation();

    assert_eq!(retriever.initialize(file.path(), false).expect("init"), 2);
    assert_eq!(retriever.snapshot().generation(), first);

    assert_eq!(retriever.initialize(file.path(), true).expect("force"), 2);
    assert!(retriever.snapshot().generation() > first);

    let q = retriever.get("q_0").expect("q_0");
    assert_eq!(q.hints, ["containers share a network namespace"]);
    assert_eq!(retriever.get("q_1").expect("q_1").difficulty, "Medium");
    assert!(retriever.search("kubernetes", 1, None, None).is_ok());
}

#[test]
fn initialize_indexes_an_already_loaded_corpus() {
    let dir = tempfile::tempdir().expect("tempdir");
    let retriever = embedding_retriever();
    retriever.load(three_categories()).expect("load");
    let generation = retriever.snapshot().generation();

    assert_eq!(retriever.initialize(&dir.path().join("unused.json"), false).expect("init"), 3);
    assert_eq!(retriever.snapshot().generation(), generation);
    assert_eq!(retriever.stats().indexed_documents, 3);
    assert!(!retriever.search("python", 3, None, None).expect("search").is_empty());
}

#[test]
fn invalid_settings_are_rejected_before_any_build() {
    let mut settings = Settings::default();
    settings.retrieval.use_embeddings = true;
    settings.embedding.use_fake = true;
    settings.embedding.dim = 0;
    assert!(matches!(Retriever::from_settings(&settings), Err(Error::InvalidConfig(_))));

    settings.embedding.dim = 16;
    settings.embedding.batch_size = 0;
    assert!(matches!(Retriever::from_settings(&settings), Err(Error::InvalidConfig(_))));
}

#[test]
fn initialize_with_missing_file_leaves_corpus_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let retriever = Retriever::lexical();
    assert_eq!(retriever.initialize(&dir.path().join("missing.json"), false).expect("init"), 0);
    assert_eq!(retriever.count(), 0);
}

#[test]
fn requirements_search_reports_query_and_categories() {
    let retriever = Retriever::lexical();
    retriever.load(three_categories()).expect("load");
    let requirements = Requirements {
        job_role: Some("Backend Engineer".into()),
        required_skills: vec!["Python".into(), "SQL".into()],
        technologies: vec!["PostgreSQL".into()],
        interview_focus_areas: vec![],
    };

    let matched = retriever.search_requirements(&requirements, 5, &SearchFilters::default()).expect("match");
    assert_eq!(matched.query, "Backend Engineer Python SQL PostgreSQL");
    assert_eq!(matched.suggested_categories, ["Python", "SQL & Databases", "Behavioral"]);
    assert_eq!(matched.questions.first().map(|q| q.id.as_str()), Some("q_0"));
}

#[test]
fn stats_track_corpus_and_index() {
    let lexical = Retriever::lexical();
    lexical.load(three_categories()).expect("load");
    assert_eq!(
        lexical.stats(),
        Stats { total_questions: 3, strategy: StrategyKind::Lexical, embedding_model: None, indexed_documents: 0 }
    );

    let embedding = embedding_retriever();
    embedding.load(three_categories()).expect("load");
    assert_eq!(embedding.stats().indexed_documents, 0);
    embedding.build_index().expect("build");
    let stats = embedding.stats();
    assert_eq!(stats.total_questions, 3);
    assert_eq!(stats.indexed_documents, 3);
    assert_eq!(stats.embedding_model.as_deref(), Some("hash:xxh64:d256"));
}

#[test]
fn read_views_follow_the_current_generation() {
    let retriever = embedding_retriever();
    retriever.reload(three_categories()).expect("reload");

    assert_eq!(retriever.categories(), ["Behavioral", "Python", "SQL"]);
    let easy = retriever.browse(&SearchFilters::difficulty("easy"), 10);
    assert_eq!(easy.iter().map(|q| q.id.as_str()).collect::<Vec<_>>(), ["q_1", "q_2"]);
    assert_eq!(retriever.get("q_1").expect("q_1").category, "SQL");

    retriever.clear();
    assert!(retriever.snapshot().is_empty());
    assert!(retriever.categories().is_empty());
    assert!(matches!(retriever.get("q_1"), Err(Error::NotFound(_))));
    assert_eq!(retriever.stats().indexed_documents, 0);
}
