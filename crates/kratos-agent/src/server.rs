//! HTTP routes for the agent-to-agent protocol.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use kratos_core::envelope::{AgentMessage, Manifest, Performative};
use kratos_pipeline::Pipeline;

/// Shared state for all handlers.
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Envelope `sender` on replies and `agent_id` in the manifest.
    pub agent_id: String,
    pub protocol: String,
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/protocol/v1/message", post(message))
        .route("/protocol/v1/manifest", get(manifest))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "kratos-agent"
    }))
}

async fn manifest(State(state): State<Arc<AppState>>) -> Json<Manifest> {
    Json(Manifest {
        agent_id: state.agent_id.clone(),
        capabilities: state.pipeline.intent_categories().to_vec(),
        protocol: state.protocol.clone(),
    })
}

/// Answer the question in `content.query`.
///
/// Success replies `INFORM {data, status: "SUCCESS"}`; a pipeline failure
/// replies `FAILURE {data, status: "ERROR", error_kind}`; an envelope without
/// a query replies `NOT_UNDERSTOOD` with 400.
async fn message(
    State(state): State<Arc<AppState>>,
    Json(envelope): Json<AgentMessage>,
) -> (StatusCode, Json<AgentMessage>) {
    let Some(question) = envelope.query() else {
        tracing::info!(
            sender = %envelope.sender,
            conversation_id = %envelope.conversation_id,
            "Envelope without query"
        );
        let reply = envelope.reply(
            &state.agent_id,
            Performative::NotUnderstood,
            json!({
                "data": "content.query is required",
                "status": "ERROR",
            }),
        );
        return (StatusCode::BAD_REQUEST, Json(reply));
    };

    let start = Instant::now();
    let reply = match state.pipeline.ask(question).await {
        Ok(answer) => {
            tracing::info!(
                sender = %envelope.sender,
                conversation_id = %envelope.conversation_id,
                duration_ms = start.elapsed().as_millis() as u64,
                "Question answered"
            );
            envelope.reply(
                &state.agent_id,
                Performative::Inform,
                json!({
                    "data": answer,
                    "status": "SUCCESS",
                }),
            )
        }
        Err(e) => {
            tracing::warn!(
                sender = %envelope.sender,
                conversation_id = %envelope.conversation_id,
                error_kind = %e.kind(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Question failed"
            );
            envelope.reply(
                &state.agent_id,
                Performative::Failure,
                json!({
                    "data": e.to_string(),
                    "status": "ERROR",
                    "error_kind": e.kind(),
                }),
            )
        }
    };

    (StatusCode::OK, Json(reply))
}
