//! Route table and handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use kgchat_agent::ReadGraphTool;
use kgchat_backend::{BackendLifecycle, StatusSnapshot};
use kgchat_telemetry::RequestContext;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::{ApiError, ApiResult};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    backend: Arc<BackendLifecycle>,
}

impl AppState {
    /// Wrap the backend lifecycle for the handlers.
    #[must_use]
    pub fn new(backend: Arc<BackendLifecycle>) -> Self {
        Self { backend }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful chat reply.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Agent answer.
    pub response: String,
}

/// Liveness reply.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

/// Build the router. CORS is permissive when `cors` is set.
pub fn router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/api/status", get(status))
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Instruction the agent receives for a user message.
#[must_use]
pub fn chat_directive(message: &str) -> String {
    format!("Use the {} tool and then {message}.", ReadGraphTool::NAME)
}

async fn status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.backend.status())
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let message = match payload {
        Ok(Json(ChatRequest {
            message: Some(message),
        })) if !message.is_empty() => message,
        Ok(_) => return Err(ApiError::BadRequest("Message is required".to_string())),
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Rejected chat body");
            return Err(ApiError::BadRequest("Message is required".to_string()));
        },
    };

    let agent = state.backend.agent().inspect_err(|e| {
        warn!(error = %e, "Chat requested before backend is ready");
    })?;

    let ctx = RequestContext::new("http").with_operation("chat");
    let span = ctx.span();
    let directive = chat_directive(&message);

    async move {
        info!(prompt = %directive, "Running agent");
        let worker_span = tracing::Span::current();
        let outcome = tokio::task::spawn_blocking(move || {
            let _entered = worker_span.enter();
            agent.run(&directive)
        })
        .await;

        match outcome {
            Ok(Ok(response)) => {
                info!(elapsed_ms = ctx.elapsed_ms(), "Agent answered");
                Ok(Json(ChatResponse { response }))
            },
            Ok(Err(e)) => {
                error!(error = %e, elapsed_ms = ctx.elapsed_ms(), "Chat failed");
                Err(ApiError::Internal(e.to_string()))
            },
            Err(join) => {
                error!(error = %join, "Agent task did not complete");
                Err(ApiError::Internal("Agent task did not complete".to_string()))
            },
        }
    }
    .instrument(span)
    .await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_directive_names_the_graph_tool() {
        assert_eq!(
            chat_directive("tell me about Alice"),
            "Use the read_graph tool and then tell me about Alice."
        );
    }
}
