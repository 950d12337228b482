//! HTTP service exposing verification, built on axum.
//!
//! The boundary layer owns caller input validation: empty or whitespace
//! question/answer is rejected with 400 before the core pipeline runs. All
//! internal degradation (fallback failures, empty evidence) has already
//! been absorbed by the core and surfaces only as weaker verdicts.

use crate::types::{VerifyRequest, VerifyResponse};
use crate::verifier::Verifier;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

pub const SERVICE_NAME: &str = "Veritor Verification Service";

/// Shared per-process service state for axum handlers.
pub struct ServiceState {
    verifier: Verifier,
    started_at: DateTime<Utc>,
}

pub type SharedService = Arc<ServiceState>;

impl ServiceState {
    pub fn new(verifier: Verifier) -> SharedService {
        Arc::new(Self {
            verifier,
            started_at: Utc::now(),
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_seconds().max(0) as u64
    }
}

/// Build the service router.
pub fn router(state: SharedService) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/verify", post(verify_handler))
        .route("/demo", get(demo_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root_handler(State(state): State<SharedService>) -> impl IntoResponse {
    Json(json!({
        "name": SERVICE_NAME,
        "corpus_size": state.verifier.corpus_size(),
        "routes": ["/health", "/verify", "/demo"],
    }))
}

async fn health_handler(State(state): State<SharedService>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "corpus_size": state.verifier.corpus_size(),
        "embedder": state.verifier.embedder_name(),
        "uptime_secs": state.uptime_secs(),
    }))
}

/// Reject requests the core is not specified to handle.
fn validate(request: &VerifyRequest) -> Result<(), &'static str> {
    if request.question.trim().is_empty() {
        return Err("question must not be empty");
    }
    if request.answer.trim().is_empty() {
        return Err("answer must not be empty");
    }
    if !(0.0..=1.0).contains(&request.threshold_green)
        || !(0.0..=1.0).contains(&request.threshold_yellow)
    {
        return Err("thresholds must be fractions in [0, 1]");
    }
    Ok(())
}

async fn verify_handler(
    State(state): State<SharedService>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, (StatusCode, Json<serde_json::Value>)> {
    if let Err(reason) = validate(&request) {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": reason }))));
    }

    let request_id = Uuid::new_v4();
    info!(%request_id, include_counter = request.include_counter, "verify request");
    let response = state.verifier.verify(&request).await;
    info!(%request_id, verdict = %response.report.verdict, confidence = response.report.confidence, "verify complete");
    Ok(Json(response))
}

/// Built-in hallucination check for quick smoke testing.
async fn demo_handler(State(state): State<SharedService>) -> impl IntoResponse {
    let request = VerifyRequest {
        question: "Who founded SpaceX?".into(),
        answer: "Jeff Bezos founded SpaceX.".into(),
        include_counter: false,
        threshold_green: 0.70,
        threshold_yellow: 0.40,
    };
    let response = state.verifier.verify(&request).await;

    let mut body = serde_json::to_value(&response).unwrap_or_else(|_| json!({}));
    if let Some(map) = body.as_object_mut() {
        map.insert("question".into(), json!(request.question));
        map.insert("answer".into(), json!(request.answer));
    }
    Json(body)
}

/// Serve until cancelled.
pub async fn run(state: SharedService, host: &str, port: u16) -> Result<(), std::io::Error> {
    let app = router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "verification service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
