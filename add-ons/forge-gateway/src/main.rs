//! Axum HTTP gateway: turns POSTed user text into orchestrator replies.

mod config;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use forge_memory::{ArtifactStore, TranscriptStore};
use forge_session::Orchestrator;
use forge_stages::{HttpCompletionClient, StageSet};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SESSION: &str = "default";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = config::Settings::load().expect("load gateway configuration");

    let client = Arc::new(HttpCompletionClient::new(
        settings.completion_url.clone(),
        settings.api_key.clone(),
    ));
    let stages = StageSet::new(client, settings.stage_prompts(), settings.stage_models());

    let artifacts = Arc::new(ArtifactStore::new(&settings.data_dir));
    let transcripts = Arc::new(
        TranscriptStore::open_path(format!("{}/transcripts", settings.data_dir))
            .expect("open transcript store"),
    );
    let orchestrator = Arc::new(
        Orchestrator::new(stages, artifacts).with_transcripts(transcripts),
    );

    let app = router(orchestrator);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("forge-gateway listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await.expect("bind listener"),
        app,
    )
    .await
    .expect("serve gateway");
}

fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/turn", post(turn))
        .route("/v1/reset", post(reset))
        .with_state(AppState { orchestrator })
}

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "healthy" }))
}

#[derive(serde::Deserialize)]
struct TurnRequest {
    session_id: Option<String>,
    text: String,
}

async fn turn(
    State(state): State<AppState>,
    Json(req): Json<TurnRequest>,
) -> Result<axum::Json<serde_json::Value>, StatusCode> {
    if req.text.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let session_id = req
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION.to_string());
    let reply = state.orchestrator.process_turn(&session_id, &req.text).await;
    Ok(axum::Json(serde_json::json!({
        "session_id": session_id,
        "reply": reply,
    })))
}

#[derive(serde::Deserialize)]
struct ResetRequest {
    session_id: Option<String>,
}

async fn reset(
    State(state): State<AppState>,
    Json(req): Json<ResetRequest>,
) -> axum::Json<serde_json::Value> {
    let session_id = req
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION.to_string());
    state.orchestrator.reset_session(&session_id);
    axum::Json(serde_json::json!({
        "session_id": session_id,
        "status": "reset",
    }))
}
