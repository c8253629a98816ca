//! HTTP API server.
//!
//! Exposes question answering and course statistics as JSON endpoints.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    docs: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let docs_dir: Option<PathBuf> = docs
        .as_deref()
        .map(Settings::expand_path)
        .or_else(|| settings.docs_dir());

    let orchestrator = Orchestrator::new(settings)?;

    if let Some(dir) = docs_dir {
        load_startup_documents(&orchestrator, dir).await;
    }

    let app = router(Arc::new(AppState { orchestrator }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Kurs API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query", "POST /api/query");
    Output::kv("Courses", "GET  /api/courses");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Load a documents folder. Failures are reported but never stop startup.
async fn load_startup_documents(orchestrator: &Orchestrator, dir: PathBuf) {
    if !dir.is_dir() {
        warn!("Documents folder {} not found, skipping", dir.display());
        return;
    }

    Output::info("Loading initial documents...");
    match orchestrator.add_course_folder(&dir, false).await {
        Ok((courses, chunks)) => {
            info!("Loaded {} courses with {} chunks", courses, chunks);
            Output::success(&format!("Loaded {} courses with {} chunks", courses, chunks));
        }
        Err(e) => Output::error(&format!("Error loading documents: {}", e)),
    }
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<String>,
    session_id: String,
}

#[derive(Serialize)]
struct CourseStats {
    total_courses: usize,
    course_titles: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(error: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(State(state): State<Arc<AppState>>, Json(req): Json<QueryRequest>) -> Response {
    info!("Processing query: {}", req.query);

    let session_id = match req.session_id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => match state.orchestrator.sessions().create_session() {
            Ok(id) => id,
            Err(e) => return error_response(e.to_string()),
        },
    };

    match state
        .orchestrator
        .answer_query(&req.query, Some(&session_id))
        .await
    {
        Ok(answer) => Json(QueryResponse {
            answer: answer.answer,
            sources: answer.sources,
            session_id,
        })
        .into_response(),
        Err(e) => {
            warn!("Query failed: {}", e);
            error_response(format!("Query processing error: {}", e))
        }
    }
}

async fn courses(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.course_analytics().await {
        Ok(analytics) => Json(CourseStats {
            total_courses: analytics.total_courses,
            course_titles: analytics.course_titles,
        })
        .into_response(),
        Err(e) => error_response(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::llm::ModelTurn;
    use crate::testing::{self, KeywordEmbedder, ScriptedModel};
    use serde_json::{json, Value};

    async fn spawn(turns: Vec<ModelTurn>) -> String {
        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(KeywordEmbedder::new()),
            testing::seeded_store().await,
            Arc::new(ScriptedModel::new(turns)),
        )
        .unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::new(AppState { orchestrator }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_query_endpoint_creates_session() {
        let base = spawn(vec![ModelTurn::text("Hi there"), ModelTurn::text("Again")]).await;
        let client = reqwest::Client::new();

        let body: Value = client
            .post(format!("{}/api/query", base))
            .json(&json!({ "query": "Hello" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["answer"], "Hi there");
        assert_eq!(body["sources"], json!([]));
        assert_eq!(body["session_id"], "session_1");

        let body: Value = client
            .post(format!("{}/api/query", base))
            .json(&json!({ "query": "Hello again", "session_id": "session_1" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["session_id"], "session_1");
    }

    #[tokio::test]
    async fn test_query_failure_is_500() {
        let base = spawn(Vec::new()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/query", base))
            .json(&json!({ "query": "Hello" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Query processing error: "));
    }

    #[tokio::test]
    async fn test_courses_endpoint() {
        let base = spawn(Vec::new()).await;

        let body: Value = reqwest::get(format!("{}/api/courses", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["total_courses"], 2);
        assert_eq!(body["course_titles"], json!(["Python Basics", "Rust Basics"]));
    }
}
