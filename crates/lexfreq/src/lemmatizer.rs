use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use grammardb::GrammarDb;
use lexfreq_morph::{Analyzer, SuffixAnalyzer};
use lexfreq_types::{Language, Lookup, percentage};
use serde::Serialize;

/// Per-stage counts. The word total is their sum, so a snapshot taken
/// while another thread resets can never disagree with itself.
#[derive(Debug, Default)]
struct Counters {
    dictionary_hits: AtomicU64,
    fallbacks: AtomicU64,
}

/// Snapshot of a [`TwoStageLemmatizer`]'s counters.
///
/// Rates are percentages and `None` until at least one word was processed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub total_words: u64,
    pub dictionary_hits: u64,
    pub fallback_count: u64,
    pub hit_rate: Option<f64>,
    pub fallback_rate: Option<f64>,
    pub dictionary_loaded: bool,
    pub dictionary_size: usize,
}

/// Dictionary lookup first, fallback analyzer second.
///
/// One instance is shared by every request; counters are atomic.
pub struct TwoStageLemmatizer {
    dictionary: Arc<GrammarDb>,
    fallback: Arc<dyn Analyzer>,
    counters: Counters,
}

impl TwoStageLemmatizer {
    pub fn new(dictionary: Arc<GrammarDb>, fallback: Arc<dyn Analyzer>) -> Self {
        Self {
            dictionary,
            fallback,
            counters: Counters::default(),
        }
    }

    pub fn dictionary(&self) -> &GrammarDb {
        &self.dictionary
    }

    /// Whether a proposed lemma is itself a dictionary entry.
    pub fn validate_lemma(&self, lemma: &str) -> bool {
        self.dictionary.is_in_dictionary(lemma)
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        let dictionary_hits = self.counters.dictionary_hits.load(Ordering::Relaxed);
        let fallback_count = self.counters.fallbacks.load(Ordering::Relaxed);
        let total_words = dictionary_hits + fallback_count;
        let rate = |part: u64| {
            (total_words > 0).then(|| percentage(part as usize, total_words as usize))
        };
        PerformanceStats {
            total_words,
            dictionary_hits,
            fallback_count,
            hit_rate: rate(dictionary_hits),
            fallback_rate: rate(fallback_count),
            dictionary_loaded: self.dictionary.is_loaded(),
            dictionary_size: self.dictionary.len(),
        }
    }

    pub fn reset_stats(&self) {
        self.counters.dictionary_hits.store(0, Ordering::Relaxed);
        self.counters.fallbacks.store(0, Ordering::Relaxed);
    }
}

impl Analyzer for TwoStageLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        match self.dictionary.lookup(word) {
            Lookup::Found(lemma) => {
                self.counters.dictionary_hits.fetch_add(1, Ordering::Relaxed);
                lemma.to_string()
            }
            Lookup::NotFound => {
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
                self.fallback.lemmatize(word)
            }
        }
    }
}

/// The lemmatizer configured for one language.
pub enum LanguageLemmatizer {
    TwoStage(TwoStageLemmatizer),
    SingleStage(Arc<dyn Analyzer>),
}

impl LanguageLemmatizer {
    pub fn two_stage(&self) -> Option<&TwoStageLemmatizer> {
        match self {
            LanguageLemmatizer::TwoStage(lemmatizer) => Some(lemmatizer),
            LanguageLemmatizer::SingleStage(_) => None,
        }
    }
}

impl Analyzer for LanguageLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        match self {
            LanguageLemmatizer::TwoStage(lemmatizer) => lemmatizer.lemmatize(word),
            LanguageLemmatizer::SingleStage(analyzer) => analyzer.lemmatize(word),
        }
    }
}

/// Process-wide lemmatizers, one per supported language.
pub struct Lemmatizers {
    russian: LanguageLemmatizer,
    belarusian: LanguageLemmatizer,
}

impl Lemmatizers {
    pub fn new(russian: LanguageLemmatizer, belarusian: LanguageLemmatizer) -> Self {
        Self {
            russian,
            belarusian,
        }
    }

    /// Russian runs the suffix analyzer alone; Belarusian checks `dictionary`
    /// first and verifies suffix candidates against its lemmas.
    pub fn standard(dictionary: Arc<GrammarDb>, morph_dir: Option<&Path>) -> Result<Self> {
        let analyzer = |language: Language| match morph_dir {
            Some(dir) => SuffixAnalyzer::load(language, dir),
            None => Ok(SuffixAnalyzer::new(language)),
        };
        let russian = analyzer(Language::Russian)?;
        let belarusian = analyzer(Language::Belarusian)?
            .with_known_lemmas(dictionary.lexicon().lemmas());
        Ok(Self::new(
            LanguageLemmatizer::SingleStage(Arc::new(russian)),
            LanguageLemmatizer::TwoStage(TwoStageLemmatizer::new(
                dictionary,
                Arc::new(belarusian),
            )),
        ))
    }

    pub fn get(&self, language: Language) -> &LanguageLemmatizer {
        match language {
            Language::Russian => &self.russian,
            Language::Belarusian => &self.belarusian,
        }
    }
}
