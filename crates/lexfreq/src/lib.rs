pub mod analysis;
pub mod export;
pub mod handlers;
pub mod lemmatizer;
pub mod setup;
pub mod stopwords;
pub mod text;

pub use analysis::{
    Analysis, AnalysisError, DEFAULT_TOP_N, Metrics, analyze, analyze_code, analyze_language,
    filter_stop_words, rank, tokenize,
};
pub use export::{CSV_HEADER, ExportError, read_csv, write_csv};
pub use handlers::{AppState, router};
pub use lemmatizer::{LanguageLemmatizer, Lemmatizers, PerformanceStats, TwoStageLemmatizer};
pub use stopwords::{StopWords, default_stop_words, parse_word_list};
pub use text::decode_text;
