use std::fs;

use tempfile::TempDir;

use qbank_core::corpus::{parse_corpus, CorpusStore};
use qbank_core::error::Error;
use qbank_core::types::{QuestionRecord, SearchFilters};

fn sample() -> Vec<QuestionRecord> {
    vec![
        QuestionRecord::new("Explain Python decorators", "Python", "Medium").with_keywords(["decorators", "functions"]),
        QuestionRecord::new("Write a query joining two tables", "SQL & Databases", "Easy").with_keywords(["join"]),
        QuestionRecord::new("Tell me about a conflict with a teammate", "Behavioral", "Easy")
            .with_hints(["Use the STAR method"]),
    ]
}

#[test]
fn load_assigns_sequential_ids_in_load_order() {
    let store = CorpusStore::new();
    let snapshot = store.load(sample()).expect("load");

    let ids: Vec<&str> = snapshot.questions().iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, ["q_0", "q_1", "q_2"]);
    assert_eq!(store.count(), 3);
    assert_eq!(store.get("q_1").expect("q_1").category, "SQL & Databases");
    assert!(matches!(store.get("q_3"), Err(Error::NotFound(_))));
    assert!(matches!(store.get("bogus"), Err(Error::NotFound(_))));
}

#[test]
fn empty_load_is_rejected_and_leaves_corpus_untouched() {
    let store = CorpusStore::new();
    assert!(matches!(store.load(vec![]), Err(Error::Validation(_))));
    assert_eq!(store.count(), 0);

    store.load(sample()).expect("load");
    let before = store.snapshot().generation();
    let mut bad = sample();
    bad.push(QuestionRecord::new("   ", "Python", "Easy"));
    assert!(matches!(store.load(bad), Err(Error::Validation(_))));
    assert_eq!(store.count(), 3, "failed load is never partially applied");
    assert_eq!(store.snapshot().generation(), before);
}

#[test]
fn reload_regenerates_ids_and_clear_empties() {
    let store = CorpusStore::new();
    let first = store.load(sample()).expect("load");
    let mut reversed = sample();
    reversed.reverse();
    let second = store.load(reversed).expect("reload");

    assert!(second.generation() > first.generation());
    assert_eq!(second.get("q_0").expect("q_0").category, "Behavioral");
    // The old snapshot is still readable by whoever holds it.
    assert_eq!(first.get("q_0").expect("q_0").category, "Python");

    let cleared = store.clear();
    assert_eq!(store.count(), 0);
    assert!(cleared.generation() > second.generation());
}

#[test]
fn records_are_normalized_on_load() {
    let store = CorpusStore::new();
    let record = QuestionRecord::new("  What is a B-tree?  ", " ", "")
        .with_keywords(["index", "  ", "", " b-tree "]);
    let snapshot = store.load(vec![record]).expect("load");
    let q = &snapshot.questions()[0];
    assert_eq!(q.text, "What is a B-tree?");
    assert_eq!(q.category, "General");
    assert_eq!(q.difficulty, "Medium");
    assert_eq!(q.keywords, vec!["index", "b-tree"]);
    assert_eq!(q.embedding_document(), "What is a B-tree? index b-tree");
}

#[test]
fn categories_and_browse() {
    let store = CorpusStore::new();
    store.load(sample()).expect("load");
    assert_eq!(store.categories(), vec!["Behavioral", "Python", "SQL & Databases"]);

    let easy = store.browse(&SearchFilters::difficulty("easy"), 10);
    assert_eq!(easy.len(), 2);
    assert_eq!(easy[0].id, "q_1");

    let limited = store.browse(&SearchFilters::default(), 1);
    assert_eq!(limited.len(), 1);
    assert!(store.browse(&SearchFilters::category("Go"), 10).is_empty());
}

#[test]
fn load_file_accepts_wrapped_and_bare_formats() {
    let tmp = TempDir::new().unwrap();
    let wrapped = tmp.path().join("wrapped.json");
    fs::write(
        &wrapped,
        r#"{"questions": [
            {"question": "What is a closure?", "category": "Python", "difficulty": "Easy",
             "keywords": ["closure"], "answer_hints": "Mention captured variables"},
            {"question": "Design a URL shortener", "category": "System Design",
             "answer_hints": ["hashing", "storage"]}
        ]}"#,
    )
    .unwrap();
    let store = CorpusStore::new();
    let snapshot = store.load_file(&wrapped).expect("load wrapped");
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.questions()[0].hints, vec!["Mention captured variables"]);
    assert_eq!(snapshot.questions()[1].difficulty, "Medium");
    assert_eq!(snapshot.questions()[1].hints, vec!["hashing", "storage"]);

    let bare = parse_corpus(r#"[{"text": "Explain CAP", "hints": null}]"#).expect("bare");
    assert_eq!(bare[0].text, "Explain CAP");
    assert_eq!(bare[0].category, "General");
    assert!(bare[0].hints.is_empty());

    assert!(matches!(parse_corpus(r#"{"items": []}"#), Err(Error::Validation(_))));
    assert!(matches!(parse_corpus("not json"), Err(Error::Json(_))));
    assert!(matches!(store.load_file(&tmp.path().join("missing.json")), Err(Error::Io(_))));
}
