use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use lexfreq_morph::SuffixAnalyzer;
use lexfreq_types::Language;

const USAGE: &str =
    "usage: cargo run -p lexfreq-morph --example lookup -- <ru|be> [--morph-dir <dir>] [--demo | <word>...]";

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let language: Language = args
        .next()
        .context(USAGE)?
        .parse()
        .context("first argument must be a language code")?;

    let mut morph_dir: Option<PathBuf> = None;
    let mut words: Vec<String> = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--morph-dir" => morph_dir = args.next().map(PathBuf::from),
            "--demo" => words.extend(demo_words(language).iter().map(|w| w.to_string())),
            _ => words.push(arg),
        }
    }
    if words.is_empty() {
        bail!(USAGE);
    }

    let morph = match &morph_dir {
        Some(dir) => SuffixAnalyzer::load(language, dir)
            .with_context(|| format!("loading exceptions from {}", dir.display()))?,
        None => SuffixAnalyzer::new(language),
    };

    println!("Language: {} ({} exceptions)", language, morph.exception_count());
    for word in words {
        let analysis = morph.analyze(&word);
        println!(
            "  {:<16} -> {:<16} [{:?}{}]",
            word,
            analysis.lemma,
            analysis.source,
            if analysis.verified { ", verified" } else { "" }
        );
    }

    Ok(())
}

fn demo_words(language: Language) -> &'static [&'static str] {
    match language {
        Language::Russian => &["котам", "книгами", "красного", "читаешь", "слонопотама"],
        Language::Belarusian => &["хлопчыкамі", "чытаюць", "беларускага", "кнігах", "сябрам"],
    }
}
