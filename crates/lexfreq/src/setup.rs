//! First-run acquisition of the compiled GrammarDB lexicon.

use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use grammardb::{CompileReport, Lexicon, compile_dir};
use tempfile::NamedTempFile;
use tracing::{info, warn};
use zip::ZipArchive;

pub const GRAMMARDB_RELEASE_URL: &str =
    "https://github.com/Belarus/GrammarDB/releases/download/RELEASE-202601/RELEASE-202601.zip";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug)]
pub enum SetupOutcome {
    AlreadyPresent,
    Installed(CompileReport),
}

/// Makes sure a compiled lexicon exists at `path`, downloading and compiling
/// the release archive at `url` when it does not.
pub async fn ensure_grammardb(path: &Path, url: &str) -> Result<SetupOutcome> {
    if path.exists() {
        info!("GrammarDB lexicon present at {}", path.display());
        return Ok(SetupOutcome::AlreadyPresent);
    }

    info!("GrammarDB lexicon missing, downloading {url}");
    let started = Instant::now();
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .user_agent(concat!("lexfreq/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;
    let archive = download_archive(&client, url).await?;
    info!(
        "downloaded {:.1} MB in {} ms",
        archive.len() as f64 / (1024.0 * 1024.0),
        started.elapsed().as_millis()
    );

    let target: PathBuf = path.to_path_buf();
    let report = tokio::task::spawn_blocking(move || install_archive(&archive, &target))
        .await
        .context("GrammarDB compile task panicked")??;
    Ok(SetupOutcome::Installed(report))
}

pub async fn download_archive(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()
        .with_context(|| format!("downloading {url}"))?;
    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("reading body of {url}"))?;
    Ok(bytes.to_vec())
}

/// Compiles a zipped corpus and writes the lexicon to `target`.
pub fn install_archive(archive: &[u8], target: &Path) -> Result<CompileReport> {
    let (lexicon, report) = compile_archive(archive)?;
    persist_lexicon(&lexicon, target)?;
    info!(
        "GrammarDB saved to {}: {} forms, {} lemmas",
        target.display(),
        report.total_forms,
        report.unique_lemmas
    );
    Ok(report)
}

/// Extracts a zipped corpus into a scratch directory and compiles it.
pub fn compile_archive(archive: &[u8]) -> Result<(Lexicon, CompileReport)> {
    compile_archive_in(archive, &std::env::temp_dir())
}

/// Like [`compile_archive`], with the scratch directory created under
/// `scratch_root`. It is removed on return, whatever the outcome.
pub fn compile_archive_in(archive: &[u8], scratch_root: &Path) -> Result<(Lexicon, CompileReport)> {
    let workdir = tempfile::Builder::new()
        .prefix("grammardb-")
        .tempdir_in(scratch_root)
        .with_context(|| format!("creating extraction directory in {}", scratch_root.display()))?;
    let mut zip = ZipArchive::new(Cursor::new(archive)).context("opening GrammarDB archive")?;
    zip.extract(workdir.path())
        .context("extracting GrammarDB archive")?;
    let (lexicon, report) = compile_dir(workdir.path())?;
    if report.files_failed > 0 {
        warn!("{} corpus files could not be parsed", report.files_failed);
    }
    Ok((lexicon, report))
}

/// Writes `lexicon` next to `target` and renames it into place.
pub fn persist_lexicon(lexicon: &Lexicon, target: &Path) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        lexicon.write_json_to(&mut writer)?;
        writer.flush().context("flushing lexicon")?;
    }
    tmp.persist(target)
        .with_context(|| format!("moving lexicon into {}", target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::write::SimpleFileOptions;

    fn zipped(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const CORPUS: &str = r#"<Wordlist>
  <Paradigm lemma="кніга"><Variant><Form>кні+гі</Form><Form>кні+гамі</Form></Variant></Paradigm>
</Wordlist>"#;

    #[test]
    fn compiles_zipped_corpus() {
        let archive = zipped(&[("RELEASE/N1.xml", CORPUS), ("README.md", "# GrammarDB")]);
        let (lexicon, report) = compile_archive(&archive).unwrap();
        assert_eq!(report.files_parsed, 1);
        assert_eq!(lexicon.get("кнігамі"), Some("кніга"));
        assert_eq!(lexicon.get("кніга"), Some("кніга"));
    }

    #[test]
    fn archive_without_corpus_is_an_error() {
        let archive = zipped(&[("README.md", "nothing here")]);
        assert!(compile_archive(&archive).is_err());
        assert!(compile_archive(b"not a zip").is_err());
    }

    #[test]
    fn scratch_directory_is_removed_on_every_outcome() {
        let root = tempfile::tempdir().unwrap();
        let entries = || std::fs::read_dir(root.path()).unwrap().count();

        compile_archive_in(&zipped(&[("N1.xml", CORPUS)]), root.path()).unwrap();
        assert_eq!(entries(), 0);

        let no_corpus = zipped(&[("docs/README.md", "nothing here")]);
        assert!(compile_archive_in(&no_corpus, root.path()).is_err());
        assert_eq!(entries(), 0);

        assert!(compile_archive_in(b"not a zip", root.path()).is_err());
        assert_eq!(entries(), 0);
    }

    #[test]
    fn install_writes_loadable_lexicon() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data").join("grammardb.json");
        let report = install_archive(&zipped(&[("N1.xml", CORPUS)]), &target).unwrap();
        assert_eq!(report.total_forms, 3);

        let lexicon = Lexicon::read_json(&target).unwrap();
        assert_eq!(lexicon.get("кнігі"), Some("кніга"));
        let leftovers = std::fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn existing_lexicon_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("grammardb.json");
        std::fs::write(&target, b"{}").unwrap();
        let outcome = ensure_grammardb(&target, "http://127.0.0.1:9/unreachable.zip")
            .await
            .unwrap();
        assert!(matches!(outcome, SetupOutcome::AlreadyPresent));
    }
}
