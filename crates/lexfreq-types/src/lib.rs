//! Shared types for the lexfreq workspace.
//!
//! Kept dependency-free so the dictionary, morphology and analysis crates can
//! agree on languages, lookup outcomes and ranked output without pulling each
//! other in.
//!
//! ```rust
//! use lexfreq_types::{Language, Lookup};
//!
//! let lang: Language = "be".parse().unwrap();
//! assert_eq!(lang, Language::Belarusian);
//! assert_eq!(Lookup::Found("кот").lemma(), Some("кот"));
//! ```

use std::fmt;
use std::str::FromStr;

/// Languages the analysis pipeline understands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Language {
    Russian,
    Belarusian,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Russian, Language::Belarusian];

    /// Parse an ISO 639-1 code (`ru`, `be`), case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ru" => Some(Language::Russian),
            "be" => Some(Language::Belarusian),
            _ => None,
        }
    }

    /// The ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::Russian => "ru",
            Language::Belarusian => "be",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::Russian => "russian",
            Language::Belarusian => "belarusian",
        })
    }
}

/// Language code that is not one of [`Language::ALL`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownLanguage(pub String);

impl fmt::Display for UnknownLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported language code: {:?} (expected \"ru\" or \"be\")", self.0)
    }
}

impl std::error::Error for UnknownLanguage {}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Outcome of a dictionary lookup.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a str),
    NotFound,
}

impl<'a> Lookup<'a> {
    pub fn lemma(self) -> Option<&'a str> {
        match self {
            Lookup::Found(lemma) => Some(lemma),
            Lookup::NotFound => None,
        }
    }

    pub fn is_found(self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// One row of a frequency table. `rank` starts at 1.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RankedLemma {
    pub rank: usize,
    pub lemma: String,
    pub frequency: usize,
}

/// Percentage of `part` in `whole`, or `0.0` when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_language_codes() {
        assert_eq!(Language::from_code("RU"), Some(Language::Russian));
        assert_eq!(Language::from_code(" be "), Some(Language::Belarusian));
        assert_eq!(Language::from_code("uk"), None);
        let err = "de".parse::<Language>().unwrap_err();
        assert!(err.to_string().contains("unsupported language"));
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
    }

    #[test]
    fn percentage_guards_zero() {
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(40, 100), 40.0);
    }

    #[test]
    fn lookup_helpers() {
        assert!(Lookup::Found("кот").is_found());
        assert_eq!(Lookup::NotFound.lemma(), None);
    }
}
