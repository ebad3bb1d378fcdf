use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;

/// Strategy for reading a compiled lexicon from disk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the JSON file and parse straight from the mapping.
    Mmap,
    /// Read the file into an owned buffer first (portable fallback).
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

/// Compiled surface form -> lemma map. Keys and values are normalized.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Lexicon {
    forms: HashMap<String, String>,
}

impl From<HashMap<String, String>> for Lexicon {
    fn from(forms: HashMap<String, String>) -> Self {
        Self { forms }
    }
}

impl Lexicon {
    /// Lemma for an already-normalized surface form.
    pub fn get(&self, form: &str) -> Option<&str> {
        self.forms.get(form).map(String::as_str)
    }

    pub fn contains_form(&self, form: &str) -> bool {
        self.forms.contains_key(form)
    }

    /// Number of surface forms.
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Distinct lemmas the forms point at.
    pub fn lemmas(&self) -> HashSet<&str> {
        self.forms.values().map(String::as_str).collect()
    }

    pub fn unique_lemmas(&self) -> usize {
        self.lemmas().len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.forms.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Read a lexicon previously written by [`Lexicon::write_json`].
    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        Self::read_json_with_mode(path, LoadMode::Owned)
    }

    pub fn read_json_with_mode(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let buffer = load_file(path, mode)?;
        Self::from_json_slice(buffer.as_slice())
            .with_context(|| format!("parse lexicon {}", path.display()))
    }

    /// Parse a flat JSON object of strings.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let forms: HashMap<String, String> =
            serde_json::from_slice(bytes).context("lexicon must be a JSON object of strings")?;
        Ok(Self { forms })
    }

    /// Write pretty-printed JSON with keys sorted, so rebuilds diff cleanly.
    pub fn write_json_to<W: Write>(&self, writer: W) -> Result<()> {
        let sorted: BTreeMap<&str, &str> = self.iter().collect();
        serde_json::to_writer_pretty(writer, &sorted).context("serialize lexicon")
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.write_json_to(&mut writer)?;
        writer
            .flush()
            .with_context(|| format!("flush {}", path.display()))
    }
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    match mode {
        LoadMode::Mmap => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Lexicon {
        Lexicon::from(HashMap::from([
            ("кот".to_string(), "кот".to_string()),
            ("катам".to_string(), "кот".to_string()),
            ("хлопчыка".to_string(), "хлопчык".to_string()),
        ]))
    }

    #[test]
    fn counts_forms_and_lemmas() {
        let lexicon = sample();
        assert_eq!(lexicon.len(), 3);
        assert_eq!(lexicon.unique_lemmas(), 2);
        assert_eq!(lexicon.get("катам"), Some("кот"));
        assert!(!lexicon.contains_form("сабака"));
    }

    #[test]
    fn json_is_sorted_and_unescaped() {
        let mut out = Vec::new();
        sample().write_json_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let katam = text.find("\"катам\"").unwrap();
        let kot = text.find("\"кот\"").unwrap();
        let boy = text.find("\"хлопчыка\"").unwrap();
        assert!(katam < kot && kot < boy);
        assert_eq!(Lexicon::from_json_slice(text.as_bytes()).unwrap(), sample());
    }

    #[test]
    fn rejects_non_string_values() {
        assert!(Lexicon::from_json_slice(br#"{"a": 1}"#).is_err());
        assert!(Lexicon::from_json_slice(b"[\"a\"]").is_err());
    }

    #[test]
    fn reads_back_in_both_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("grammardb.json");
        sample().write_json(&path).unwrap();
        for mode in [LoadMode::Mmap, LoadMode::Owned] {
            assert_eq!(Lexicon::read_json_with_mode(&path, mode).unwrap(), sample());
        }
    }
}
