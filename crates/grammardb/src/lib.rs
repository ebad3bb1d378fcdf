//! Compile the GrammarDB Belarusian grammar corpus and look words up in it.
//!
//! The corpus ships as XML paradigms (a lemma plus its inflected forms). This
//! crate folds those paradigms into a flat surface form -> lemma [`Lexicon`],
//! persists it as JSON, and serves O(1) lookups through [`GrammarDb`].
//!
//! # Pipeline
//! 1. [`ParadigmReader`] streams `<Paradigm>` elements from one XML file,
//!    yielding [`ParadigmOutcome::Parsed`] or [`ParadigmOutcome::Skipped`].
//! 2. [`LexiconBuilder`] folds outcomes into the map: the lemma maps to
//!    itself, and the first paradigm to claim a surface form keeps it.
//! 3. [`compile_dir`] runs the fold over every XML file of a directory in
//!    sorted order and reports a [`CompileReport`].
//! 4. [`Lexicon::write_json`] / [`GrammarDb::load`] persist and reload it.
//!
//! # Example
//! ```no_run
//! use grammardb::{GrammarDb, compile_dir};
//!
//! # fn main() -> anyhow::Result<()> {
//! let (lexicon, report) = compile_dir("/path/to/GrammarDB")?;
//! println!("{} forms, {} lemmas", report.total_forms, report.unique_lemmas);
//! lexicon.write_json("data/grammardb.json")?;
//!
//! let db = GrammarDb::load("data/grammardb.json");
//! assert_eq!(db.lookup("Хлопчыкі").lemma(), Some("хлопчык"));
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p grammardb --example stats -- <grammardb.json>`.

pub mod compile;
pub mod corpus;
pub mod lexicon;

use std::path::Path;

use lexfreq_types::Lookup;
use tracing::{info, warn};

pub use compile::{CompileReport, CorpusError, LexiconBuilder, compile, compile_dir};
pub use corpus::{
    Paradigm, ParadigmOutcome, ParadigmReader, STRESS_MARKS, SkipReason, has_unrecognized_mark,
    normalize_form,
};
pub use lexicon::{Lexicon, LoadMode};

/// Size and load state of a [`GrammarDb`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DictionaryStats {
    pub loaded: bool,
    pub total_forms: usize,
    pub unique_lemmas: usize,
}

/// Read-only dictionary lookup table.
///
/// An unloaded table answers [`Lookup::NotFound`] for every word.
#[derive(Debug, Default)]
pub struct GrammarDb {
    lexicon: Lexicon,
    loaded: bool,
    /// Counted once; the lexicon never changes after construction.
    unique_lemmas: usize,
}

impl GrammarDb {
    /// Load a compiled lexicon, degrading to an empty table on any failure.
    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::load_with_mode(path, LoadMode::Mmap)
    }

    pub fn load_with_mode(path: impl AsRef<Path>, mode: LoadMode) -> Self {
        let path = path.as_ref();
        match Lexicon::read_json_with_mode(path, mode) {
            Ok(lexicon) => {
                info!(
                    "GrammarDB loaded from {}: {} word forms",
                    path.display(),
                    lexicon.len()
                );
                Self::from_lexicon(lexicon)
            }
            Err(err) => {
                warn!("GrammarDB unavailable at {}: {err:#}", path.display());
                Self::empty()
            }
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_lexicon(lexicon: Lexicon) -> Self {
        let unique_lemmas = lexicon.unique_lemmas();
        Self {
            lexicon,
            loaded: true,
            unique_lemmas,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Look a word up. The query is trimmed and lowercased first.
    pub fn lookup(&self, word: &str) -> Lookup<'_> {
        if !self.loaded {
            return Lookup::NotFound;
        }
        match self.lexicon.get(&normalize_query(word)) {
            Some(lemma) => Lookup::Found(lemma),
            None => Lookup::NotFound,
        }
    }

    pub fn is_in_dictionary(&self, word: &str) -> bool {
        self.loaded && self.lexicon.contains_form(&normalize_query(word))
    }

    /// Number of word forms held.
    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn stats(&self) -> DictionaryStats {
        DictionaryStats {
            loaded: self.loaded,
            total_forms: self.lexicon.len(),
            unique_lemmas: self.unique_lemmas,
        }
    }
}

fn normalize_query(word: &str) -> String {
    word.trim().to_lowercase()
}
