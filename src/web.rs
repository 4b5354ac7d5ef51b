//! Dashboard HTTP server.
//!
//! Two JSON routes sit in front of the pipeline: `/api/data` returns the
//! full dashboard payload and `/api/ask` answers a free-text question.
//! Every request rebuilds its bundles from the store; nothing is cached
//! or shared between requests beyond the immutable clients.

use crate::dashboard;
use crate::resolver;
use crate::store::DatasetStore;
use crate::summarizer::Summarizer;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use warp::Filter;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>CampusLens</title></head>
<body>
<h1>CampusLens</h1>
<p>Dashboard metrics: <a href="/api/data">/api/data</a></p>
<p>Ask a question: <code>/api/ask?q=average+package+for+CSE</code></p>
</body>
</html>
"#;

/// Shared, immutable server state.
pub struct AppState {
    pub store: DatasetStore,
    pub summarizer: Summarizer,
    pub top_n: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AskQuery {
    q: Option<String>,
}

/// Build the route tree.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_state = warp::any().map(move || state.clone());

    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML));

    let data = warp::path!("api" / "data")
        .and(warp::get())
        .and(with_state.clone())
        .and_then(handle_data);

    let ask = warp::path!("api" / "ask")
        .and(warp::get())
        .and(warp::query::<AskQuery>())
        .and(with_state)
        .and_then(handle_ask);

    index.or(data).or(ask)
}

async fn handle_data(state: Arc<AppState>) -> Result<impl warp::Reply, warp::Rejection> {
    let payload = dashboard::build_payload(&state.store, &state.summarizer, state.top_n).await;
    Ok(warp::reply::json(&payload))
}

async fn handle_ask(
    query: AskQuery,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let question = query.q.unwrap_or_default();
    // Rankings stay uncapped here; the resolver applies the question's
    // own top-N when composing the answer.
    let bundles = dashboard::build_bundles(&state.store, None).await;
    let answer = resolver::answer(&question, &bundles);
    Ok(warp::reply::json(&answer))
}

/// Run the dashboard server until shutdown.
pub async fn serve(state: AppState, addr: SocketAddr) {
    info!(%addr, "dashboard server listening");
    warp::serve(routes(Arc::new(state))).run(addr).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StorageConfig, SummarizerConfig};
    use crate::resolver::FALLBACK_GUIDANCE;

    fn test_state(local_dir: std::path::PathBuf) -> Arc<AppState> {
        let storage = StorageConfig {
            local_dir: Some(local_dir),
            ..StorageConfig::default()
        };
        Arc::new(AppState {
            store: DatasetStore::new(&storage),
            summarizer: Summarizer::new(SummarizerConfig::default()),
            top_n: Some(5),
        })
    }

    #[tokio::test]
    async fn test_api_data_serves_bundles() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(data_dir.join("exam_data.csv"), "department,marks\nCSE,91\n").unwrap();

        let routes = routes(test_state(dir.path().to_path_buf()));
        let response = warp::test::request().path("/api/data").reply(&routes).await;

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(
            body["academic"]["metrics"]["overall_average_marks"],
            serde_json::json!(91.0)
        );
        // Missing datasets degrade to error bundles, never failures.
        assert!(body["placement"]["metrics"]["error"]["error"].is_string());
    }

    #[tokio::test]
    async fn test_api_ask_answers_question() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::write(
            data_dir.join("placement_data.csv"),
            "department,placement_status\nCSE,yes\nCSE,no\n",
        )
        .unwrap();

        let routes = routes(test_state(dir.path().to_path_buf()));
        let response = warp::test::request()
            .path("/api/ask?q=placement%20rate%20for%20CSE")
            .reply(&routes)
            .await;

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["matched"], serde_json::json!(true));
        assert_eq!(
            body["summary"],
            serde_json::json!("Placement rate for CSE: 50%.")
        );
    }

    #[tokio::test]
    async fn test_api_ask_without_question_returns_guidance() {
        let dir = tempfile::tempdir().unwrap();
        let routes = routes(test_state(dir.path().to_path_buf()));

        let response = warp::test::request().path("/api/ask").reply(&routes).await;
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["matched"], serde_json::json!(false));
        assert_eq!(body["summary"], serde_json::json!(FALLBACK_GUIDANCE));
    }
}
