//! Streaming reader for GrammarDB XML paradigms.
//!
//! The corpus looks like:
//!
//! ```xml
//! <Wordlist>
//!   <Paradigm pdgId="1" lemma="ко+т" tag="NCM">
//!     <Variant id="a" lemma="ко+т">
//!       <Form tag="NS">ко+т</Form>
//!       <Form tag="DP">ката+м</Form>
//!     </Variant>
//!   </Paradigm>
//! </Wordlist>
//! ```
//!
//! [`ParadigmReader`] yields one [`ParadigmOutcome`] per `<Paradigm>`; defects
//! are reported as [`ParadigmOutcome::Skipped`] values instead of errors so the
//! caller decides the skip policy.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Characters the corpus uses to mark stress: a plain `+` after the stressed
/// vowel and U+0301 COMBINING ACUTE ACCENT.
pub const STRESS_MARKS: [char; 2] = ['+', '\u{0301}'];

/// A paradigm exactly as written in the corpus (markers not yet stripped).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Paradigm {
    pub lemma: String,
    pub forms: Vec<String>,
}

/// Why a paradigm did not make it into the lexicon.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// `<Paradigm>` without a usable `lemma` attribute.
    MissingLemma { position: u64 },
    /// Broken markup. A syntax error ends the document.
    Malformed { position: u64, message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingLemma { position } => {
                write!(f, "paradigm at byte {position} has no lemma")
            }
            SkipReason::Malformed { position, message } => {
                write!(f, "malformed XML at byte {position}: {message}")
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParadigmOutcome {
    Parsed(Paradigm),
    Skipped(SkipReason),
}

/// Strip stress markers, trim and lowercase a lemma or surface form.
///
/// Returns `None` when nothing is left. Applying it twice is a no-op.
pub fn normalize_form(raw: &str) -> Option<String> {
    let stripped: String = raw.chars().filter(|c| !STRESS_MARKS.contains(c)).collect();
    let normalized = stripped.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// True when `text` still contains a combining diacritic (U+0300..U+036F).
///
/// Only [`STRESS_MARKS`] are stripped; any other stress convention survives
/// normalization and yields keys that live queries will never match.
pub fn has_unrecognized_mark(text: &str) -> bool {
    text.chars().any(|c| ('\u{0300}'..='\u{036F}').contains(&c))
}

struct PartialParadigm {
    lemma: Option<String>,
    defect: Option<String>,
    forms: Vec<String>,
    position: u64,
}

impl PartialParadigm {
    fn finish(self) -> ParadigmOutcome {
        if let Some(message) = self.defect {
            return ParadigmOutcome::Skipped(SkipReason::Malformed {
                position: self.position,
                message,
            });
        }
        match self.lemma.filter(|l| !l.trim().is_empty()) {
            Some(lemma) => ParadigmOutcome::Parsed(Paradigm {
                lemma,
                forms: self.forms,
            }),
            None => ParadigmOutcome::Skipped(SkipReason::MissingLemma {
                position: self.position,
            }),
        }
    }
}

enum Step {
    OpenParadigm {
        lemma: std::result::Result<Option<String>, String>,
        empty: bool,
    },
    OpenForm,
    Text(String),
    CloseForm,
    CloseParadigm,
    Error(String),
    Eof,
    Continue,
}

/// Lazy iterator over the paradigms of one XML document.
pub struct ParadigmReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    current: Option<PartialParadigm>,
    in_form: bool,
    form_text: String,
    finished: bool,
    malformed: bool,
}

impl ParadigmReader<BufReader<File>> {
    /// Open an XML file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<'a> ParadigmReader<&'a [u8]> {
    pub fn from_xml(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> ParadigmReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::new(),
            current: None,
            in_form: false,
            form_text: String::new(),
            finished: false,
            malformed: false,
        }
    }

    /// Whether the document stopped early on broken markup.
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    fn byte_position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    fn read_step(&mut self) -> Step {
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf) {
            Err(err) => Step::Error(err.to_string()),
            Ok(Event::Start(start)) => match start.local_name().as_ref() {
                b"Paradigm" => Step::OpenParadigm {
                    lemma: lemma_attr(&start),
                    empty: false,
                },
                b"Form" => Step::OpenForm,
                _ => Step::Continue,
            },
            Ok(Event::Empty(start)) if start.local_name().as_ref() == b"Paradigm" => {
                Step::OpenParadigm {
                    lemma: lemma_attr(&start),
                    empty: true,
                }
            }
            Ok(Event::End(end)) => match end.local_name().as_ref() {
                b"Paradigm" => Step::CloseParadigm,
                b"Form" => Step::CloseForm,
                _ => Step::Continue,
            },
            Ok(Event::Text(text)) if self.in_form => match text.unescape() {
                Ok(text) => Step::Text(text.into_owned()),
                Err(err) => Step::Error(err.to_string()),
            },
            Ok(Event::CData(data)) if self.in_form => {
                Step::Text(String::from_utf8_lossy(&data).into_owned())
            }
            Ok(Event::Eof) => Step::Eof,
            Ok(_) => Step::Continue,
        }
    }

    fn fail(&mut self, message: String) -> ParadigmOutcome {
        self.finished = true;
        self.malformed = true;
        self.current = None;
        ParadigmOutcome::Skipped(SkipReason::Malformed {
            position: self.byte_position(),
            message,
        })
    }
}

impl<R: BufRead> Iterator for ParadigmReader<R> {
    type Item = ParadigmOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.read_step() {
                Step::OpenParadigm { lemma, empty } => {
                    let (lemma, defect) = match lemma {
                        Ok(lemma) => (lemma, None),
                        Err(message) => (None, Some(message)),
                    };
                    let partial = PartialParadigm {
                        lemma,
                        defect,
                        forms: Vec::new(),
                        position: self.byte_position(),
                    };
                    if empty {
                        return Some(partial.finish());
                    }
                    self.current = Some(partial);
                }
                Step::OpenForm => {
                    if self.current.is_some() {
                        self.in_form = true;
                        self.form_text.clear();
                    }
                }
                Step::Text(text) => self.form_text.push_str(&text),
                Step::CloseForm => {
                    if self.in_form {
                        self.in_form = false;
                        if let Some(partial) = self.current.as_mut() {
                            partial.forms.push(std::mem::take(&mut self.form_text));
                        }
                    }
                }
                Step::CloseParadigm => {
                    self.in_form = false;
                    if let Some(partial) = self.current.take() {
                        return Some(partial.finish());
                    }
                }
                Step::Error(message) => return Some(self.fail(message)),
                Step::Eof => {
                    if self.current.is_some() {
                        return Some(self.fail("document ended inside <Paradigm>".into()));
                    }
                    self.finished = true;
                }
                Step::Continue => {}
            }
        }
        None
    }
}

fn lemma_attr(start: &BytesStart<'_>) -> std::result::Result<Option<String>, String> {
    match start.try_get_attribute("lemma") {
        Ok(Some(attr)) => attr
            .unescape_value()
            .map(|value| Some(value.into_owned()))
            .map_err(|err| err.to_string()),
        Ok(None) => Ok(None),
        Err(err) => Err(err.to_string()),
    }
}
