//! Fallback morphological analysis for Russian and Belarusian.
//!
//! [`Analyzer`] is the capability the lemmatizer falls back to when a word is
//! not in the dictionary: any total, deterministic `word -> lemma` function.
//! Closures implement it directly, which keeps test doubles trivial.
//!
//! [`SuffixAnalyzer`] is the bundled implementation, a rules-plus-exceptions
//! lemmatizer:
//! 1. Return the surface form if it is a known lemma.
//! 2. Check the exception list (`<code>.exc`).
//! 3. Apply language-specific suffix rules, longest suffix first, preferring
//!    a candidate that is a known lemma.
//! 4. Fall back to the first rule candidate, then to the surface form.
//!
//! # Example
//! ```no_run
//! use lexfreq_morph::{Analyzer, SuffixAnalyzer};
//! use lexfreq_types::Language;
//!
//! # fn main() -> anyhow::Result<()> {
//! let morph = SuffixAnalyzer::load(Language::Belarusian, "/path/to/morph")?
//!     .with_known_lemmas(["кот", "хлопчык"]);
//! assert_eq!(morph.lemmatize("хлопчыкамі"), "хлопчык");
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p lexfreq-morph --example lookup -- <ru|be> [--demo|<word>]`.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lexfreq_types::Language;

/// Turns any word into its best-guess lemma. Must never fail.
pub trait Analyzer: Send + Sync {
    fn lemmatize(&self, word: &str) -> String;

    /// One lemma per input word, in input order.
    fn lemmatize_batch(&self, words: &[String]) -> Vec<String> {
        words.iter().map(|word| self.lemmatize(word)).collect()
    }
}

impl<F> Analyzer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn lemmatize(&self, word: &str) -> String {
        self(word)
    }
}

/// Where a lemma originated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CandidateSource {
    Surface,
    Exception,
    Rule {
        suffix: &'static str,
        replacement: &'static str,
    },
}

/// A lemma paired with its provenance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Analysis {
    pub lemma: String,
    pub source: CandidateSource,
    /// The lemma is a known lemma or a curated exception.
    pub verified: bool,
}

/// Shortest stem a suffix rule may leave behind, in characters.
pub const DEFAULT_MIN_STEM: usize = 3;

/// Rule-based analyzer with optional exceptions and lemma verification.
#[derive(Clone, Debug)]
pub struct SuffixAnalyzer {
    language: Language,
    exceptions: HashMap<String, String>,
    known_lemmas: Option<HashSet<String>>,
    min_stem: usize,
}

impl SuffixAnalyzer {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            exceptions: HashMap::new(),
            known_lemmas: None,
            min_stem: DEFAULT_MIN_STEM,
        }
    }

    /// Load the exception list `<code>.exc` from `morph_dir`.
    ///
    /// The file is optional; a missing one is treated as empty.
    pub fn load(language: Language, morph_dir: impl AsRef<Path>) -> Result<Self> {
        let path = morph_dir
            .as_ref()
            .join(format!("{}.exc", language.code()));
        Ok(Self::new(language).with_exceptions(load_exc(path)?))
    }

    pub fn with_exceptions<I, S>(mut self, exceptions: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        self.exceptions.extend(
            exceptions
                .into_iter()
                .map(|(surface, lemma)| (normalize(surface.as_ref()), normalize(lemma.as_ref()))),
        );
        self
    }

    /// Attach the set of lemmas that rule candidates are verified against.
    pub fn with_known_lemmas<I, S>(mut self, lemmas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known_lemmas = Some(lemmas.into_iter().map(|l| normalize(l.as_ref())).collect());
        self
    }

    pub fn with_min_stem(mut self, min_stem: usize) -> Self {
        self.min_stem = min_stem;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn exception_count(&self) -> usize {
        self.exceptions.len()
    }

    fn is_known(&self, lemma: &str) -> bool {
        self.known_lemmas
            .as_ref()
            .is_some_and(|known| known.contains(lemma))
    }

    /// Analyze a word and report where the lemma came from.
    pub fn analyze(&self, word: &str) -> Analysis {
        let surface = normalize(word);

        if self.is_known(&surface) {
            return Analysis {
                lemma: surface,
                source: CandidateSource::Surface,
                verified: true,
            };
        }

        if let Some(lemma) = self.exceptions.get(&surface) {
            return Analysis {
                lemma: lemma.clone(),
                source: CandidateSource::Exception,
                verified: true,
            };
        }

        let mut guess: Option<Analysis> = None;
        for &(suffix, replacement) in rules_for(self.language) {
            let Some(candidate) = apply_rule(&surface, suffix, replacement, self.min_stem) else {
                continue;
            };
            if self.is_known(&candidate) {
                return Analysis {
                    lemma: candidate,
                    source: CandidateSource::Rule {
                        suffix,
                        replacement,
                    },
                    verified: true,
                };
            }
            if guess.is_none() && !needs_verification(suffix, replacement) {
                guess = Some(Analysis {
                    lemma: candidate,
                    source: CandidateSource::Rule {
                        suffix,
                        replacement,
                    },
                    verified: false,
                });
            }
        }

        guess.unwrap_or(Analysis {
            lemma: surface,
            source: CandidateSource::Surface,
            verified: false,
        })
    }
}

impl Analyzer for SuffixAnalyzer {
    fn lemmatize(&self, word: &str) -> String {
        self.analyze(word).lemma
    }
}

fn load_exc(path: PathBuf) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let file =
        File::open(&path).with_context(|| format!("open exception file {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut map = HashMap::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line =
            line.with_context(|| format!("read line {} in {}", lineno + 1, path.display()))?;
        if line.trim_start().starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(surface), Some(lemma)) = (parts.next(), parts.next()) else {
            continue;
        };
        map.entry(normalize(surface))
            .or_insert_with(|| normalize(lemma));
    }
    Ok(map)
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn apply_rule(surface: &str, suffix: &str, replacement: &str, min_stem: usize) -> Option<String> {
    let stem = surface.strip_suffix(suffix)?;
    if stem.chars().count() < min_stem {
        return None;
    }
    Some(format!("{stem}{replacement}"))
}

/// Rules whose output is too often a different word to use as a guess.
/// A bare `-а` strip turns genitives into nominatives (`кота`) but also
/// truncates feminine nominatives (`книга`, `работа`).
fn needs_verification(suffix: &str, replacement: &str) -> bool {
    suffix == "а" && replacement.is_empty()
}

/// Suffix rules, longest suffix first. Adjective endings precede nominal
/// ones of the same length.
fn rules_for(language: Language) -> &'static [(&'static str, &'static str)] {
    match language {
        Language::Russian => &[
            ("ающимися", "ать"),
            ("ывается", "ывать"),
            ("аешься", "аться"),
            ("ается", "аться"),
            ("аются", "аться"),
            ("алась", "аться"),
            ("ались", "аться"),
            ("аешь", "ать"),
            ("аете", "ать"),
            ("ится", "иться"),
            ("ятся", "иться"),
            ("ыми", "ый"),
            ("ими", "ий"),
            ("ого", "ый"),
            ("его", "ий"),
            ("ому", "ый"),
            ("ему", "ий"),
            ("ает", "ать"),
            ("аем", "ать"),
            ("ают", "ать"),
            ("ала", "ать"),
            ("али", "ать"),
            ("ило", "ить"),
            ("ила", "ить"),
            ("или", "ить"),
            ("ами", ""),
            ("ами", "а"),
            ("ями", "я"),
            ("иям", "ия"),
            ("ых", "ый"),
            ("их", "ий"),
            ("ая", "ый"),
            ("яя", "ий"),
            ("ую", "ый"),
            ("юю", "ий"),
            ("ое", "ый"),
            ("ые", "ый"),
            ("ие", "ий"),
            ("ой", "ый"),
            ("ит", "ить"),
            ("ат", "ать"),
            ("ал", "ать"),
            ("ил", "ить"),
            ("ах", ""),
            ("ах", "а"),
            ("ях", "я"),
            ("ам", ""),
            ("ам", "а"),
            ("ям", "я"),
            ("ов", ""),
            ("ев", ""),
            ("ом", ""),
            ("ем", ""),
            ("ы", ""),
            ("ы", "а"),
            ("и", ""),
            ("и", "а"),
            ("а", ""),
            ("у", ""),
            ("у", "а"),
            ("е", ""),
            ("е", "а"),
            ("ю", "я"),
        ],
        Language::Belarusian => &[
            ("аючымі", "аць"),
            ("аецца", "ацца"),
            ("аюцца", "ацца"),
            ("алася", "ацца"),
            ("аліся", "ацца"),
            ("аюць", "аць"),
            ("аеце", "аць"),
            ("ымі", "ы"),
            ("імі", "і"),
            ("ага", "ы"),
            ("яга", "і"),
            ("аму", "ы"),
            ("яму", "і"),
            ("аеш", "аць"),
            ("аем", "аць"),
            ("ала", "аць"),
            ("алі", "аць"),
            ("амі", ""),
            ("амі", "а"),
            ("ямі", "я"),
            ("ых", "ы"),
            ("іх", "і"),
            ("ая", "ы"),
            ("яя", "і"),
            ("ую", "ы"),
            ("юю", "і"),
            ("ае", "ы"),
            ("ыя", "ы"),
            ("ія", "і"),
            ("ой", "ы"),
            ("аю", "аць"),
            ("аў", "аць"),
            ("аў", ""),
            ("ах", ""),
            ("ах", "а"),
            ("ях", "я"),
            ("ам", ""),
            ("ам", "а"),
            ("ям", "я"),
            ("ом", ""),
            ("ем", ""),
            ("ы", ""),
            ("ы", "а"),
            ("і", ""),
            ("і", "а"),
            ("а", ""),
            ("у", ""),
            ("у", "а"),
            ("е", ""),
            ("е", "а"),
            ("ю", "я"),
        ],
    }
}
