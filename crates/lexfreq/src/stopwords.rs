use std::collections::HashSet;

use lexfreq_types::Language;

const RUSSIAN: &[&str] = &[
    // prepositions
    "в", "на", "с", "к", "по", "о", "у", "из", "за", "от", "до", "для", "при", "через", "над",
    "под", "об", "про", "без", "около", "перед", "между", "среди", "вокруг", "после", "кроме",
    // conjunctions
    "и", "а", "но", "или", "что", "как", "если", "когда", "чтобы", "хотя", "потому", "так",
    "тоже", "также", "либо", "зато", "однако", "же",
    // particles
    "не", "ни", "бы", "ли", "ведь", "уж", "вот", "даже", "лишь", "только", "почти", "ну", "то",
    "нибудь",
    // pronouns
    "я", "ты", "он", "она", "оно", "мы", "вы", "они", "мой", "твой", "свой", "наш", "ваш", "его",
    "её", "их", "этот", "тот", "такой", "весь", "сам", "самый", "который", "какой", "чей", "кто",
    // auxiliaries and numerals
    "быть", "это", "себя", "мочь", "один", "два", "три", "четыре", "пять", "раз",
    // other
    "да", "нет", "вс", "всё", "ещё", "уже", "там", "тут", "где", "куда", "здесь", "тогда",
    "потом", "теперь", "очень", "более",
];

// Latin lookalikes catch mixed-layout typing.
const BELARUSIAN: &[&str] = &[
    // prepositions
    "у", "y", "ў", "на", "з", "да", "па", "пра", "для", "праз", "над", "пад",
    "перад", "каля", "ля", "пасля", "без", "ад", "за", "аб", "пры", "між", "сярод",
    // conjunctions
    "і", "i", "й", "а", "a", "але", "ці", "ci", "альбо", "што", "каб", "калі", "як", "хаця",
    "таму", "бо", "таксама", "жа",
    // particles
    "не", "ne", "ні", "б", "бы", "ж", "вось", "ажно", "нават", "толькі", "хоць", "ледзь",
    "амаль",
    // pronouns
    "я", "ты", "ён", "яна", "яно", "мы", "вы", "яны", "мой", "твой", "свой", "наш", "ваш", "яго",
    "яе", "іх", "ix", "гэты", "той", "такі", "увесь", "сам", "самы", "які", "чый", "хто", "гэта",
    // other
    "быць", "усё", "ўсё", "яшчэ", "ужо", "там", "тут", "дзе", "куды", "тады", "потым", "цяпер",
    "вельмі", "больш", "так", "ды",
];

/// Built-in stop words for a language.
pub fn default_stop_words(language: Language) -> &'static [&'static str] {
    match language {
        Language::Russian => RUSSIAN,
        Language::Belarusian => BELARUSIAN,
    }
}

/// The active stop-word set for one analysis run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StopWords {
    language: Language,
    words: HashSet<String>,
}

impl StopWords {
    pub fn defaults(language: Language) -> Self {
        Self {
            language,
            words: default_stop_words(language)
                .iter()
                .map(|word| word.to_string())
                .collect(),
        }
    }

    pub fn empty(language: Language) -> Self {
        Self {
            language,
            words: HashSet::new(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Adds words (trimmed, lowercased, blanks ignored). Returns how many were new.
    pub fn extend<I, S>(&mut self, words: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        words
            .into_iter()
            .filter_map(|word| normalize(word.as_ref()))
            .filter(|word| self.words.insert(word.clone()))
            .count()
    }

    /// Removes words. Returns how many were present.
    pub fn remove<I, S>(&mut self, words: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        words
            .into_iter()
            .filter_map(|word| normalize(word.as_ref()))
            .filter(|word| self.words.remove(word))
            .count()
    }

    pub fn contains(&self, word: &str) -> bool {
        if self.words.contains(word) {
            return true;
        }
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn sorted(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.words.iter().map(String::as_str).collect();
        words.sort_unstable();
        words
    }
}

/// Splits a comma-separated list as typed by a user: `"шесть, Сем ,,восем"`.
pub fn parse_word_list(input: &str) -> Vec<String> {
    input.split(',').filter_map(normalize).collect()
}

fn normalize(word: &str) -> Option<String> {
    let word = word.trim();
    (!word.is_empty()).then(|| word.to_lowercase())
}
