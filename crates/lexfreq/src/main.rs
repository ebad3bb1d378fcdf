use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use grammardb::{GrammarDb, LoadMode};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use lexfreq::setup::{GRAMMARDB_RELEASE_URL, SetupOutcome, ensure_grammardb};
use lexfreq::{AppState, DEFAULT_TOP_N, Lemmatizers, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_GRAMMARDB_PATH: &str = "data/grammardb.json";
const DEFAULT_MAX_TOP_N: usize = 500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config();
    info!("binding to {}:{}", config.host, config.port);
    info!(
        "using GrammarDB at {} (mode: {:?})",
        config.grammardb_path.display(),
        config.grammardb_mode
    );
    if let Some(dir) = &config.morph_dir {
        info!("using morphology exceptions from {}", dir.display());
    }

    if config.auto_download {
        match ensure_grammardb(&config.grammardb_path, &config.grammardb_url).await {
            Ok(SetupOutcome::AlreadyPresent) => {}
            Ok(SetupOutcome::Installed(report)) => info!(
                "GrammarDB installed: {} paradigms from {} files",
                report.paradigms, report.files_parsed
            ),
            Err(err) => warn!("GrammarDB setup failed, continuing without it: {err:#}"),
        }
    }

    let start = Instant::now();
    let dictionary = Arc::new(GrammarDb::load_with_mode(
        &config.grammardb_path,
        config.grammardb_mode,
    ));
    let lemmatizers = Lemmatizers::standard(Arc::clone(&dictionary), config.morph_dir.as_deref())?;
    info!(
        "lemmatizers ready in {} ms (dictionary loaded: {})",
        start.elapsed().as_millis(),
        dictionary.is_loaded()
    );

    let state = AppState {
        lemmatizers: Arc::new(lemmatizers),
        default_top_n: config.default_top_n,
        max_top_n: config.max_top_n,
    };

    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen address")?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    grammardb_path: PathBuf,
    grammardb_mode: LoadMode,
    grammardb_url: String,
    auto_download: bool,
    morph_dir: Option<PathBuf>,
    default_top_n: usize,
    max_top_n: usize,
}

fn load_config() -> Config {
    let mut auto_download = false;
    let mut cli_grammardb: Option<PathBuf> = None;
    let mut cli_mode: Option<LoadMode> = None;
    let mut cli_morph_dir: Option<PathBuf> = None;
    let mut args = env::args().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--auto-download" => auto_download = true,
            "--grammardb" => {
                if let Some(path) = args.next() {
                    cli_grammardb = Some(PathBuf::from(path));
                }
            }
            "--morph-dir" => {
                if let Some(path) = args.next() {
                    cli_morph_dir = Some(PathBuf::from(path));
                }
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--grammardb=") {
                    cli_grammardb = Some(PathBuf::from(path));
                } else if let Some(path) = arg.strip_prefix("--morph-dir=") {
                    cli_morph_dir = Some(PathBuf::from(path));
                } else if let Some(mode) = arg.strip_prefix("--grammardb-mode=") {
                    cli_mode = parse_load_mode(mode);
                }
            }
        }
    }

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let grammardb_path = cli_grammardb
        .or_else(|| env::var("GRAMMARDB_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GRAMMARDB_PATH));
    let grammardb_mode = cli_mode
        .or_else(|| {
            env::var("GRAMMARDB_LOAD_MODE")
                .ok()
                .as_deref()
                .and_then(parse_load_mode)
        })
        .unwrap_or(LoadMode::Mmap);
    let grammardb_url =
        env::var("GRAMMARDB_URL").unwrap_or_else(|_| GRAMMARDB_RELEASE_URL.to_string());
    let auto_download = auto_download
        || env::var("GRAMMARDB_AUTO_DOWNLOAD")
            .ok()
            .as_deref()
            .is_some_and(parse_flag);
    let morph_dir = cli_morph_dir.or_else(|| env::var("MORPH_DIR").ok().map(PathBuf::from));
    let max_top_n = env_usize("MAX_TOP_N").unwrap_or(DEFAULT_MAX_TOP_N);
    let default_top_n = env_usize("DEFAULT_TOP_N")
        .unwrap_or(DEFAULT_TOP_N)
        .min(max_top_n);

    Config {
        host,
        port,
        grammardb_path,
        grammardb_mode,
        grammardb_url,
        auto_download,
        morph_dir,
        default_top_n,
        max_top_n,
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_load_mode(raw: &str) -> Option<LoadMode> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Some(LoadMode::Mmap),
        "owned" => Some(LoadMode::Owned),
        _ => None,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
