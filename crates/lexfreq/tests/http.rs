use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use grammardb::{GrammarDb, Lexicon};
use lexfreq::handlers::{AppState, router};
use lexfreq::{Lemmatizers, read_csv};

fn make_state() -> AppState {
    let lexicon = Lexicon::from(
        [
            ("кот", "кот"),
            ("ката", "кот"),
            ("катам", "кот"),
            ("сабака", "сабака"),
            ("сабакі", "сабака"),
        ]
        .into_iter()
        .map(|(form, lemma)| (form.to_string(), lemma.to_string()))
        .collect::<HashMap<_, _>>(),
    );
    let lemmatizers =
        Lemmatizers::standard(Arc::new(GrammarDb::from_lexicon(lexicon)), None).unwrap();
    AppState {
        lemmatizers: Arc::new(lemmatizers),
        default_top_n: 50,
        max_top_n: 2,
    }
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn healthz_ok() {
    let (status, body) = send(router(make_state()), get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn analyze_ranks_belarusian_lemmas() {
    let request = post_json(
        "/v1/analyze",
        serde_json::json!({
            "text": "Кот і сабака. Ката бачыў сабакі, катам не да смеху.",
            "language": "be",
            "top_n": 10
        }),
    );
    let (status, body) = send_json(router(make_state()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["language"], "be");

    // top_n is capped by max_top_n.
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["lemma"], "кот");
    assert_eq!(items[0]["frequency"], 3);
    assert_eq!(items[0]["rank"], 1);
    assert_eq!(items[1]["lemma"], "сабака");
    assert_eq!(items[1]["frequency"], 2);

    let metrics = &body["metrics"];
    assert_eq!(metrics["total_tokens"], 10);
    // і, не, да
    assert_eq!(metrics["filtered_out"], 3);
}

#[tokio::test]
async fn custom_stop_words_apply_per_request() {
    let request = post_json(
        "/v1/analyze",
        serde_json::json!({
            "text": "кот не кот",
            "language": "be",
            "add_stop_words": ["Кот"],
            "remove_stop_words": ["не"]
        }),
    );
    let (status, body) = send_json(router(make_state()), request).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["lemma"], "не");
}

#[tokio::test]
async fn analyze_rejects_bad_input() {
    let state = make_state();
    let (status, body) = send_json(
        router(state.clone()),
        post_json("/v1/analyze", serde_json::json!({"text": "кот", "language": "uk"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("uk"));

    let (status, body) = send_json(
        router(state),
        post_json(
            "/v1/analyze",
            serde_json::json!({"text": "кот", "language": "ru", "top_n": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("top_n"));
}

#[tokio::test]
async fn raw_body_accepts_windows_1251() {
    // "котам котам" in Windows-1251.
    let body = b"\xEA\xEE\xF2\xE0\xEC \xEA\xEE\xF2\xE0\xEC".to_vec();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/analyze/raw?language=ru")
        .body(Body::from(body))
        .unwrap();
    let (status, body) = send_json(router(make_state()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["lemma"], "кот");
    assert_eq!(body["items"][0]["frequency"], 2);
}

#[tokio::test]
async fn csv_export_is_downloadable() {
    let request = post_json(
        "/v1/analyze/csv",
        serde_json::json!({
            "text": "сабака кот сабака",
            "language": "be",
            "source_name": "story.txt"
        }),
    );
    let response = router(make_state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"text_analysis_story.csv\""
    );
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    assert!(body.starts_with(b"\xEF\xBB\xBFRank,Lemma,Frequency"));
    let table = read_csv(&body).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table[0].lemma, "сабака");
    assert_eq!(table[0].frequency, 2);
}

#[tokio::test]
async fn stop_word_listing_is_sorted() {
    let (status, body) = send_json(router(make_state()), get("/v1/stopwords/ru")).await;
    assert_eq!(status, StatusCode::OK);
    let items: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    let mut sorted = items.clone();
    sorted.sort_unstable();
    assert_eq!(items, sorted);
    assert_eq!(body["total"], items.len());

    let (status, _) = send_json(router(make_state()), get("/v1/stopwords/de")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_track_and_reset_belarusian_lookups() {
    let state = make_state();
    let request = post_json(
        "/v1/analyze",
        serde_json::json!({"text": "катам слонопотама", "language": "be"}),
    );
    let (status, _) = send_json(router(state.clone()), request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_json(router(state.clone()), get("/v1/stats")).await;
    let stats = body.as_array().unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0]["language"], "be");
    assert_eq!(stats[0]["lemmatizer"]["total_words"], 2);
    assert_eq!(stats[0]["lemmatizer"]["dictionary_hits"], 1);
    assert_eq!(stats[0]["lemmatizer"]["fallback_count"], 1);
    assert_eq!(stats[0]["lemmatizer"]["hit_rate"], 50.0);
    assert_eq!(stats[0]["dictionary"]["unique_lemmas"], 2);

    let reset = Request::builder()
        .method("POST")
        .uri("/v1/stats/reset")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(router(state.clone()), reset).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send_json(router(state), get("/v1/stats")).await;
    assert_eq!(body[0]["lemmatizer"]["total_words"], 0);
    assert!(body[0]["lemmatizer"]["hit_rate"].is_null());
}
