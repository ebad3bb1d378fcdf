use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use grammardb::DictionaryStats;
use lexfreq_types::{Language, RankedLemma};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::analysis::{Analysis, AnalysisError, Metrics, analyze_language};
use crate::export::{export_file_name, write_csv};
use crate::lemmatizer::{Lemmatizers, PerformanceStats};
use crate::stopwords::{StopWords, default_stop_words};
use crate::text::decode_text;

#[derive(Clone)]
pub struct AppState {
    pub lemmatizers: Arc<Lemmatizers>,
    pub default_top_n: usize,
    pub max_top_n: usize,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    pub language: String,
    pub top_n: Option<usize>,
    #[serde(default)]
    pub add_stop_words: Vec<String>,
    #[serde(default)]
    pub remove_stop_words: Vec<String>,
    /// Original file name, used for the CSV attachment name.
    pub source_name: Option<String>,
}

#[derive(Deserialize)]
pub struct RawQuery {
    pub language: String,
    pub top_n: Option<usize>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    language: &'static str,
    stop_words: usize,
    metrics: Metrics,
    items: Vec<RankedRow>,
}

#[derive(Serialize)]
struct RankedRow {
    rank: usize,
    lemma: String,
    frequency: usize,
}

impl From<RankedLemma> for RankedRow {
    fn from(row: RankedLemma) -> Self {
        Self {
            rank: row.rank,
            lemma: row.lemma,
            frequency: row.frequency,
        }
    }
}

#[derive(Serialize)]
struct StopWordsResponse {
    language: &'static str,
    total: usize,
    items: Vec<&'static str>,
}

#[derive(Serialize)]
struct LanguageStats {
    language: &'static str,
    lemmatizer: PerformanceStats,
    dictionary: DictionaryView,
}

#[derive(Serialize)]
struct DictionaryView {
    loaded: bool,
    total_forms: usize,
    unique_lemmas: usize,
}

impl From<DictionaryStats> for DictionaryView {
    fn from(stats: DictionaryStats) -> Self {
        Self {
            loaded: stats.loaded,
            total_forms: stats.total_forms,
            unique_lemmas: stats.unique_lemmas,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/analyze", post(analyze_json))
        .route("/v1/analyze/raw", post(analyze_raw))
        .route("/v1/analyze/csv", post(analyze_csv))
        .route("/v1/stopwords/{language}", get(stop_words))
        .route("/v1/stats", get(stats))
        .route("/v1/stats/reset", post(reset_stats))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn analyze_json(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let job = AnalysisJob::from_request(&state, request)?;
    let (language, stop_words, analysis) = job.run(&state).await?;
    Ok(Json(AnalyzeResponse::new(language, stop_words, analysis)))
}

async fn analyze_raw(
    State(state): State<AppState>,
    Query(params): Query<RawQuery>,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let language = parse_language(&params.language)?;
    let job = AnalysisJob {
        text: decode_text(&body).into_owned(),
        language,
        top_n: state.clamp_top_n(params.top_n)?,
        stop_words: StopWords::defaults(language),
        source_name: None,
    };
    let (language, stop_words, analysis) = job.run(&state).await?;
    Ok(Json(AnalyzeResponse::new(language, stop_words, analysis)))
}

async fn analyze_csv(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Response, ApiError> {
    let job = AnalysisJob::from_request(&state, request)?;
    let file_name = export_file_name(job.source_name.as_deref());
    let (_, _, analysis) = job.run(&state).await?;

    let body = write_csv(&analysis.table).map_err(|err| {
        error!("csv export failed: {err}");
        ApiError::Internal
    })?;
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|_| ApiError::Internal)?;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn stop_words(Path(code): Path<String>) -> Result<Json<StopWordsResponse>, ApiError> {
    let language = parse_language(&code)?;
    let mut items = default_stop_words(language).to_vec();
    items.sort_unstable();
    Ok(Json(StopWordsResponse {
        language: language.code(),
        total: items.len(),
        items,
    }))
}

async fn stats(State(state): State<AppState>) -> Json<Vec<LanguageStats>> {
    let stats = Language::ALL
        .into_iter()
        .filter_map(|language| {
            let lemmatizer = state.lemmatizers.get(language).two_stage()?;
            Some(LanguageStats {
                language: language.code(),
                lemmatizer: lemmatizer.performance_stats(),
                dictionary: lemmatizer.dictionary().stats().into(),
            })
        })
        .collect();
    Json(stats)
}

async fn reset_stats(State(state): State<AppState>) -> StatusCode {
    for language in Language::ALL {
        if let Some(lemmatizer) = state.lemmatizers.get(language).two_stage() {
            lemmatizer.reset_stats();
        }
    }
    StatusCode::NO_CONTENT
}

/// A validated request, ready to run off the async executor.
struct AnalysisJob {
    text: String,
    language: Language,
    top_n: usize,
    stop_words: StopWords,
    source_name: Option<String>,
}

impl AnalysisJob {
    fn from_request(state: &AppState, request: AnalyzeRequest) -> Result<Self, ApiError> {
        let language = parse_language(&request.language)?;
        let top_n = state.clamp_top_n(request.top_n)?;
        let mut stop_words = StopWords::defaults(language);
        stop_words.extend(&request.add_stop_words);
        stop_words.remove(&request.remove_stop_words);
        Ok(Self {
            text: request.text,
            language,
            top_n,
            stop_words,
            source_name: request.source_name,
        })
    }

    async fn run(self, state: &AppState) -> Result<(Language, usize, Analysis), ApiError> {
        let lemmatizers = Arc::clone(&state.lemmatizers);
        let language = self.language;
        let stop_word_count = self.stop_words.len();
        debug!(
            "analyzing {} bytes of {language} text (top {})",
            self.text.len(),
            self.top_n
        );
        let analysis = tokio::task::spawn_blocking(move || {
            analyze_language(
                &lemmatizers,
                self.language,
                &self.text,
                &self.stop_words,
                self.top_n,
            )
        })
        .await
        .map_err(|err| {
            error!("analysis task failed: {err}");
            ApiError::Internal
        })??;
        Ok((language, stop_word_count, analysis))
    }
}

impl AppState {
    fn clamp_top_n(&self, top_n: Option<usize>) -> Result<usize, ApiError> {
        let top_n = top_n.unwrap_or(self.default_top_n);
        if top_n == 0 {
            return Err(ApiError::bad_request("top_n must be >= 1"));
        }
        Ok(top_n.min(self.max_top_n))
    }
}

impl AnalyzeResponse {
    fn new(language: Language, stop_words: usize, analysis: Analysis) -> Self {
        Self {
            language: language.code(),
            stop_words,
            metrics: analysis.metrics,
            items: analysis.table.into_iter().map(RankedRow::from).collect(),
        }
    }
}

fn parse_language(code: &str) -> Result<Language, ApiError> {
    code.parse::<Language>()
        .map_err(|err| ApiError::bad_request(err.to_string()))
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
