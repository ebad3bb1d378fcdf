use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::corpus::{
    Paradigm, ParadigmOutcome, ParadigmReader, SkipReason, has_unrecognized_mark, normalize_form,
};
use crate::lexicon::Lexicon;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus directory not found: {0}")]
    MissingDir(PathBuf),
    #[error("no parsable GrammarDB XML files under {dir} ({failed} failed)")]
    NoParsableFiles { dir: PathBuf, failed: usize },
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counters gathered while compiling.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CompileReport {
    pub paradigms: usize,
    pub skipped_paradigms: usize,
    pub files_parsed: usize,
    pub files_failed: usize,
    pub total_forms: usize,
    pub unique_lemmas: usize,
    /// Keys that still carry a combining mark after normalization.
    pub unrecognized_marks: usize,
}

/// Accumulates paradigms into a lexicon.
///
/// A paradigm's own lemma always maps to itself. Every other surface form is
/// claimed by the first paradigm that produces it; later claims are ignored.
#[derive(Debug, Default)]
pub struct LexiconBuilder {
    forms: HashMap<String, String>,
    report: CompileReport,
}

impl LexiconBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one reader outcome into the builder.
    pub fn accept(&mut self, outcome: ParadigmOutcome) {
        match outcome {
            ParadigmOutcome::Parsed(paradigm) => {
                self.add_paradigm(&paradigm);
            }
            ParadigmOutcome::Skipped(reason) => {
                match &reason {
                    SkipReason::MissingLemma { .. } => debug!("skipping paradigm: {reason}"),
                    SkipReason::Malformed { .. } => warn!("skipping paradigm: {reason}"),
                }
                self.report.skipped_paradigms += 1;
            }
        }
    }

    /// Insert a paradigm. Returns `false` when its lemma normalizes to nothing.
    pub fn add_paradigm(&mut self, paradigm: &Paradigm) -> bool {
        let Some(lemma) = normalize_form(&paradigm.lemma) else {
            debug!("skipping paradigm with empty lemma {:?}", paradigm.lemma);
            self.report.skipped_paradigms += 1;
            return false;
        };

        if self.forms.insert(lemma.clone(), lemma.clone()).is_none()
            && has_unrecognized_mark(&lemma)
        {
            self.report.unrecognized_marks += 1;
        }

        for raw in &paradigm.forms {
            let Some(form) = normalize_form(raw) else {
                continue;
            };
            if let Entry::Vacant(slot) = self.forms.entry(form) {
                if has_unrecognized_mark(slot.key()) {
                    self.report.unrecognized_marks += 1;
                }
                slot.insert(lemma.clone());
            }
        }

        self.report.paradigms += 1;
        true
    }

    /// Stream one XML file into the builder.
    ///
    /// Returns `false` when the file could not be opened or stopped on broken
    /// markup; paradigms read before the break are kept.
    pub fn accept_file(&mut self, path: &Path) -> bool {
        let mut reader = match ParadigmReader::open(path) {
            Ok(reader) => reader,
            Err(err) => {
                warn!("skipping {}: {err:#}", path.display());
                self.report.files_failed += 1;
                return false;
            }
        };

        let before = self.forms.len();
        for outcome in reader.by_ref() {
            self.accept(outcome);
        }

        if reader.is_malformed() {
            warn!("{} is malformed; kept what was read before the error", path.display());
            self.report.files_failed += 1;
            false
        } else {
            debug!(
                "parsed {}: {} new forms",
                path.display(),
                self.forms.len() - before
            );
            self.report.files_parsed += 1;
            true
        }
    }

    /// Number of distinct surface forms collected so far.
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn report(&self) -> &CompileReport {
        &self.report
    }

    pub fn finish(self) -> (Lexicon, CompileReport) {
        let mut report = self.report;
        let lexicon = Lexicon::from(self.forms);
        report.total_forms = lexicon.len();
        report.unique_lemmas = lexicon.unique_lemmas();
        (lexicon, report)
    }
}

/// Build a lexicon from any sequence of reader outcomes.
pub fn compile<I>(outcomes: I) -> (Lexicon, CompileReport)
where
    I: IntoIterator<Item = ParadigmOutcome>,
{
    outcomes
        .into_iter()
        .fold(LexiconBuilder::new(), |mut builder, outcome| {
            builder.accept(outcome);
            builder
        })
        .finish()
}

/// Compile every `*.xml` file below `dir`, in sorted path order.
pub fn compile_dir(dir: impl AsRef<Path>) -> Result<(Lexicon, CompileReport), CorpusError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(CorpusError::MissingDir(dir.to_path_buf()));
    }

    let files = find_xml_files(dir)?;
    info!("found {} XML files under {}", files.len(), dir.display());

    let mut builder = LexiconBuilder::new();
    for path in &files {
        builder.accept_file(path);
    }

    if builder.report().files_parsed == 0 {
        return Err(CorpusError::NoParsableFiles {
            dir: dir.to_path_buf(),
            failed: builder.report().files_failed,
        });
    }

    let (lexicon, report) = builder.finish();
    info!(
        "compiled {} word forms, {} unique lemmas ({} files, {} failed, {} paradigms skipped)",
        report.total_forms,
        report.unique_lemmas,
        report.files_parsed,
        report.files_failed,
        report.skipped_paradigms
    );
    if report.unrecognized_marks > 0 {
        warn!(
            "{} keys still carry combining marks after stress stripping",
            report.unrecognized_marks
        );
    }
    Ok((lexicon, report))
}

fn find_xml_files(dir: &Path) -> Result<Vec<PathBuf>, CorpusError> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|source| CorpusError::Scan {
            path: current.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| CorpusError::Scan {
                path: current.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
            {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paradigm(lemma: &str, forms: &[&str]) -> ParadigmOutcome {
        ParadigmOutcome::Parsed(Paradigm {
            lemma: lemma.into(),
            forms: forms.iter().map(|f| f.to_string()).collect(),
        })
    }

    #[test]
    fn lemma_maps_to_itself_even_without_forms() {
        let (lexicon, report) = compile([paradigm("Хло+пчык", &[])]);
        assert_eq!(lexicon.get("хлопчык"), Some("хлопчык"));
        assert_eq!(report.paradigms, 1);
        assert_eq!(report.total_forms, 1);
    }

    #[test]
    fn first_claim_wins_across_paradigms() {
        let (lexicon, _) = compile([
            paradigm("пяць", &["пяці", "пяццю"]),
            paradigm("пяцёра", &["пяці", "пяцёх"]),
        ]);
        assert_eq!(lexicon.get("пяці"), Some("пяць"));
        assert_eq!(lexicon.get("пяцёх"), Some("пяцёра"));
    }

    #[test]
    fn own_lemma_overrides_an_earlier_form_claim() {
        let (lexicon, _) = compile([paradigm("мыць", &["мыла"]), paradigm("мыла", &["мылам"])]);
        assert_eq!(lexicon.get("мыла"), Some("мыла"));
        for lemma in lexicon.lemmas() {
            assert_eq!(lexicon.get(lemma), Some(lemma));
        }
    }

    #[test]
    fn skips_are_counted_and_processing_continues() {
        let (lexicon, report) = compile([
            ParadigmOutcome::Skipped(SkipReason::MissingLemma { position: 0 }),
            paradigm("+", &["нешта"]),
            paradigm("кот", &["ката+м", "", "+"]),
        ]);
        assert_eq!(report.skipped_paradigms, 2);
        assert_eq!(report.paradigms, 1);
        assert_eq!(lexicon.len(), 2);
        assert!(!lexicon.contains_form("нешта"));
    }

    #[test]
    fn counts_forms_with_foreign_stress_marks() {
        let (_, report) = compile([paradigm("мова", &["мо\u{0300}вы", "мо\u{0301}ве"])]);
        assert_eq!(report.unrecognized_marks, 1);
    }

    #[test]
    fn missing_directory_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = compile_dir(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, CorpusError::MissingDir(_)));
    }
}
