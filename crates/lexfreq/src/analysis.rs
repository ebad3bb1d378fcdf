//! Text → tokens → lemmas → filtered lemmas → ranked frequency table.

use std::collections::{HashMap, HashSet};

use lexfreq_types::{Language, RankedLemma, UnknownLanguage, percentage};
use serde::Serialize;
use thiserror::Error;

use lexfreq_morph::Analyzer;

use crate::lemmatizer::Lemmatizers;
use crate::stopwords::StopWords;

pub const DEFAULT_TOP_N: usize = 50;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    UnknownLanguage(#[from] UnknownLanguage),
    #[error("stop words are for {stop_words}, text is {text}")]
    LanguageMismatch {
        text: Language,
        stop_words: Language,
    },
}

/// Summary numbers for one run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metrics {
    pub total_tokens: usize,
    pub filtered_out: usize,
    pub filtered_out_percent: f64,
    pub unique_lemmas: usize,
    pub lexical_diversity: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    pub metrics: Metrics,
    pub table: Vec<RankedLemma>,
}

/// Letters that belong to a token: Russian and Belarusian Cyrillic plus basic Latin.
pub fn is_token_char(c: char) -> bool {
    matches!(
        c,
        'а'..='я' | 'А'..='Я' | 'ё' | 'Ё' | 'і' | 'І' | 'ў' | 'Ў' | 'a'..='z' | 'A'..='Z'
    )
}

/// Maximal runs of token letters, lowercased.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !is_token_char(c))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub fn filter_stop_words(lemmas: Vec<String>, stop_words: &StopWords) -> Vec<String> {
    lemmas
        .into_iter()
        .filter(|lemma| !stop_words.contains(lemma))
        .collect()
}

/// Count lemmas and keep the `limit` most frequent.
///
/// Equal counts keep the order in which the lemmas first appeared.
pub fn rank<S: AsRef<str>>(lemmas: &[S], limit: usize) -> Vec<RankedLemma> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for lemma in lemmas {
        let lemma = lemma.as_ref();
        match positions.get(lemma) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                positions.insert(lemma, counts.len());
                counts.push((lemma, 1));
            }
        }
    }

    // Stable, so ties stay in first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, (lemma, frequency))| RankedLemma {
            rank: idx + 1,
            lemma: lemma.to_string(),
            frequency,
        })
        .collect()
}

pub fn analyze(
    text: &str,
    lemmatizer: &dyn Analyzer,
    stop_words: &StopWords,
    limit: usize,
) -> Analysis {
    let tokens = tokenize(text);
    let total_tokens = tokens.len();
    let lemmas = lemmatizer.lemmatize_batch(&tokens);
    let filtered = filter_stop_words(lemmas, stop_words);
    let filtered_out = total_tokens - filtered.len();

    let unique_lemmas = filtered.iter().collect::<HashSet<_>>().len();
    let table = rank(&filtered, limit);

    Analysis {
        metrics: Metrics {
            total_tokens,
            filtered_out,
            filtered_out_percent: percentage(filtered_out, total_tokens),
            unique_lemmas,
            lexical_diversity: percentage(unique_lemmas, total_tokens),
        },
        table,
    }
}

/// [`analyze`] with the lemmatizer picked by language.
pub fn analyze_language(
    lemmatizers: &Lemmatizers,
    language: Language,
    text: &str,
    stop_words: &StopWords,
    limit: usize,
) -> Result<Analysis, AnalysisError> {
    if stop_words.language() != language {
        return Err(AnalysisError::LanguageMismatch {
            text: language,
            stop_words: stop_words.language(),
        });
    }
    Ok(analyze(text, lemmatizers.get(language), stop_words, limit))
}

/// Parses a language code, then runs [`analyze_language`].
pub fn analyze_code(
    lemmatizers: &Lemmatizers,
    code: &str,
    text: &str,
    stop_words: &StopWords,
    limit: usize,
) -> Result<Analysis, AnalysisError> {
    let language: Language = code.parse()?;
    analyze_language(lemmatizers, language, text, stop_words, limit)
}
