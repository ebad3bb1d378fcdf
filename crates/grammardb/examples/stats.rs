use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use grammardb::{Lexicon, LoadMode};

fn main() -> Result<()> {
    let lexicon_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p grammardb --example stats -- <grammardb.json> [word...]")?;

    let lexicon = Lexicon::read_json_with_mode(&lexicon_path, LoadMode::Mmap)
        .with_context(|| format!("loading lexicon from {}", lexicon_path.display()))?;

    let mut paradigm_sizes: HashMap<&str, usize> = HashMap::new();
    for (_, lemma) in lexicon.iter() {
        *paradigm_sizes.entry(lemma).or_default() += 1;
    }
    let largest = paradigm_sizes
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)));

    println!("Lexicon      : {}", lexicon_path.display());
    println!("Word forms   : {}", lexicon.len());
    println!("Lemmas       : {}", paradigm_sizes.len());
    if !paradigm_sizes.is_empty() {
        println!(
            "Forms/lemma  : {:.2}",
            lexicon.len() as f64 / paradigm_sizes.len() as f64
        );
    }
    if let Some((lemma, size)) = largest {
        println!("Largest      : {lemma} ({size} forms)");
    }

    for word in env::args().skip(2) {
        let key = word.trim().to_lowercase();
        println!("'{}' -> {:?}", word, lexicon.get(&key));
    }

    Ok(())
}
