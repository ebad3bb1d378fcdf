use std::path::PathBuf;

use grammardb::{CorpusError, GrammarDb, Lexicon, LoadMode, compile_dir};
use lexfreq_types::Lookup;

fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn compiles_fixture_corpus_in_sorted_order() {
    let (lexicon, report) = compile_dir(fixture_dir("grammardb")).expect("compile fixtures");

    assert_eq!(report.files_parsed, 3);
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.skipped_paradigms, 2);
    assert_eq!(report.total_forms, 13);
    assert_eq!(report.unique_lemmas, 5);
    assert_eq!(report.unrecognized_marks, 0);

    // A1.xml is read before A2.xml, so it keeps the shared form.
    assert_eq!(lexicon.get("катам"), Some("кот"));
    // A2's own lemma still maps to itself.
    assert_eq!(lexicon.get("ката"), Some("ката"));
    assert_eq!(lexicon.get("каты"), Some("ката"));
    assert_eq!(lexicon.get("хлопчыкі"), Some("хлопчык"));
    assert_eq!(lexicon.get("чытаюць"), Some("чытаць"));
}

#[test]
fn malformed_file_keeps_paradigms_read_before_the_error() {
    let (lexicon, _) = compile_dir(fixture_dir("grammardb")).expect("compile fixtures");
    assert_eq!(lexicon.get("дома"), Some("дом"));
    assert!(!lexicon.contains_form("стол"));
    assert!(!lexicon.contains_form("безымянны"));
}

#[test]
fn every_lemma_looks_itself_up() {
    let (lexicon, _) = compile_dir(fixture_dir("grammardb")).expect("compile fixtures");
    let db = GrammarDb::from_lexicon(lexicon.clone());
    for lemma in lexicon.lemmas() {
        assert_eq!(db.lookup(lemma), Lookup::Found(lemma));
    }
}

#[test]
fn directory_without_parsable_files_is_fatal() {
    let err = compile_dir(fixture_dir("broken_only")).unwrap_err();
    match err {
        CorpusError::NoParsableFiles { failed, .. } => assert_eq!(failed, 1),
        other => panic!("unexpected error: {other}"),
    }

    let empty = tempfile::tempdir().unwrap();
    assert!(matches!(
        compile_dir(empty.path()),
        Err(CorpusError::NoParsableFiles { failed: 0, .. })
    ));
}

#[test]
fn compiled_lexicon_survives_a_json_round_trip() {
    let (lexicon, _) = compile_dir(fixture_dir("grammardb")).expect("compile fixtures");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grammardb.json");
    lexicon.write_json(&path).unwrap();

    assert_eq!(Lexicon::read_json(&path).unwrap(), lexicon);
    let db = GrammarDb::load_with_mode(&path, LoadMode::Owned);
    assert!(db.is_loaded());
    assert_eq!(db.lookup("Хлопчыка"), Lookup::Found("хлопчык"));
}

#[test]
fn load_degrades_to_empty_table() {
    let dir = tempfile::tempdir().unwrap();

    let missing = GrammarDb::load(dir.path().join("missing.json"));
    assert!(!missing.is_loaded());

    let corrupt_path = dir.path().join("corrupt.json");
    std::fs::write(&corrupt_path, b"{\"kot\": ").unwrap();
    let corrupt = GrammarDb::load(&corrupt_path);
    assert!(!corrupt.is_loaded());
    assert_eq!(corrupt.lookup("kot"), Lookup::NotFound);

    let latin1_path = dir.path().join("latin1.json");
    std::fs::write(&latin1_path, b"{\"k\xf6t\": \"k\xf6t\"}").unwrap();
    assert!(!GrammarDb::load(&latin1_path).is_loaded());
}
