use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use grammardb::{GrammarDb, Lexicon, LoadMode, compile_dir};
use lexfreq::setup::{GRAMMARDB_RELEASE_URL, SetupOutcome, ensure_grammardb, persist_lexicon};
use lexfreq_types::Lookup;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grammardb-tool")]
#[command(about = "Build and inspect the compiled GrammarDB lexicon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a directory of GrammarDB XML files into a JSON lexicon.
    Compile { input: PathBuf, output: PathBuf },
    /// Download the release archive and compile it, unless `output` exists.
    Fetch {
        output: PathBuf,
        #[arg(long, default_value = GRAMMARDB_RELEASE_URL)]
        url: String,
    },
    /// Print lexicon size figures.
    Stats { lexicon: PathBuf },
    /// Look words up in a compiled lexicon.
    Lookup {
        lexicon: PathBuf,
        #[arg(required = true)]
        words: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile { input, output } => {
            let start = Instant::now();
            let (lexicon, report) = compile_dir(&input)
                .with_context(|| format!("compiling {}", input.display()))?;
            persist_lexicon(&lexicon, &output)?;
            info!("wrote {} in {} ms", output.display(), start.elapsed().as_millis());
            println!(
                "{} paradigms ({} skipped), {} files parsed ({} failed)",
                report.paradigms, report.skipped_paradigms, report.files_parsed, report.files_failed
            );
            println!(
                "{} word forms, {} lemmas",
                report.total_forms, report.unique_lemmas
            );
            if report.unrecognized_marks > 0 {
                println!(
                    "{} forms kept combining marks other than stress",
                    report.unrecognized_marks
                );
            }
        }
        Commands::Fetch { output, url } => match ensure_grammardb(&output, &url).await? {
            SetupOutcome::AlreadyPresent => {
                println!("{} already exists, nothing to do", output.display())
            }
            SetupOutcome::Installed(report) => println!(
                "installed {}: {} word forms, {} lemmas",
                output.display(),
                report.total_forms,
                report.unique_lemmas
            ),
        },
        Commands::Stats { lexicon } => {
            let lexicon = read(&lexicon)?;
            let lemmas = lexicon.unique_lemmas();
            println!("Word forms   : {}", lexicon.len());
            println!("Lemmas       : {lemmas}");
            if lemmas > 0 {
                println!("Forms/lemma  : {:.2}", lexicon.len() as f64 / lemmas as f64);
            }
        }
        Commands::Lookup { lexicon, words } => {
            let db = GrammarDb::from_lexicon(read(&lexicon)?);
            for word in words {
                match db.lookup(&word) {
                    Lookup::Found(lemma) => println!("{word}\t{lemma}"),
                    Lookup::NotFound => println!("{word}\t-"),
                }
            }
        }
    }

    Ok(())
}

fn read(path: &Path) -> Result<Lexicon> {
    if !path.exists() {
        bail!("lexicon {} does not exist", path.display());
    }
    Lexicon::read_json_with_mode(path, LoadMode::Mmap)
        .with_context(|| format!("loading lexicon from {}", path.display()))
}
