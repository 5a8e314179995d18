//! API endpoint handlers
//!
//! This module implements the HTTP endpoints of the prompt relay: the
//! `analyze` and `quote` operations under the deployment base path, plus
//! root and health endpoints.

use crate::api::cors::build_cors_layer;
use crate::conversion::response_converter::{clean_advice, clean_quote};
use crate::core::config::Config;
use crate::core::constants::{message, route};
use crate::core::provider::Provider;
use crate::models::relay::{AnalyzeResponse, ErrorResponse, PromptRequest, QuoteResponse};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Application state shared across handlers
///
/// `provider` is `None` when no credential was configured; the relay then
/// answers 503 instead of calling out.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provider: Option<Arc<dyn Provider>>,
}

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors);
    let analyze_path = state.config.route_path(route::ANALYZE);
    let quote_path = state.config.route_path(route::QUOTE);

    Router::new()
        .route("/", get(root))
        .route(route::HEALTH, get(health_check))
        .route(&analyze_path, post(analyze))
        .route(&quote_path, post(quote))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Failures surfaced by the relay endpoints
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("provider is not configured")]
    Unconfigured,

    #[error("prompt is missing or empty")]
    MissingPrompt,

    #[error("request body exceeds the configured limit")]
    PayloadTooLarge,

    #[error("{message}")]
    Provider {
        message: &'static str,
        details: Option<String>,
    },
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            RelayError::Unconfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error: message::SERVICE_UNAVAILABLE.to_string(),
                    details: None,
                },
            ),
            RelayError::MissingPrompt => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message::PROMPT_MISSING.to_string(),
                    details: None,
                },
            ),
            RelayError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorResponse {
                    error: message::PAYLOAD_TOO_LARGE.to_string(),
                    details: None,
                },
            ),
            RelayError::Provider { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: message.to_string(),
                    details,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// The two relay operations; they differ only in response shape and cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Analyze,
    Quote,
}

impl Endpoint {
    fn name(&self) -> &'static str {
        match self {
            Endpoint::Analyze => "analyze",
            Endpoint::Quote => "quote",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Endpoint::Analyze => message::ANALYZE_FAILED,
            Endpoint::Quote => message::QUOTE_FAILED,
        }
    }

    fn respond(&self, text: &str) -> Response {
        match self {
            Endpoint::Analyze => Json(AnalyzeResponse {
                advice: clean_advice(text),
            })
            .into_response(),
            Endpoint::Quote => Json(QuoteResponse {
                quote: clean_quote(text),
            })
            .into_response(),
        }
    }
}

/// POST {base}/analyze - Financial advice for a prompt
async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Response, RelayError> {
    relay(&state, Endpoint::Analyze, payload).await
}

/// POST {base}/quote - Motivational quote for a prompt
async fn quote(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Response, RelayError> {
    relay(&state, Endpoint::Quote, payload).await
}

/// Shared request lifecycle: availability, validation, provider call, cleanup
async fn relay(
    state: &AppState,
    endpoint: Endpoint,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Response, RelayError> {
    let request_id = uuid::Uuid::new_v4();

    let Some(provider) = state.provider.as_ref() else {
        warn!("[{}] {} rejected: provider not configured", request_id, endpoint.name());
        return Err(RelayError::Unconfigured);
    };

    // An unreadable body is treated like a body without a prompt, except
    // when it was cut off by the body limit.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(
                "[{}] {} rejected: body over {} bytes",
                request_id,
                endpoint.name(),
                state.config.max_body_bytes
            );
            return Err(RelayError::PayloadTooLarge);
        }
        Err(rejection) => {
            debug!("[{}] unreadable body: {}", request_id, rejection.body_text());
            PromptRequest::default()
        }
    };

    let Some(prompt) = request.non_empty_prompt() else {
        debug!("[{}] {} rejected: empty prompt", request_id, endpoint.name());
        return Err(RelayError::MissingPrompt);
    };

    info!(
        "📥 [{}] {} request: model={}, prompt_chars={}",
        request_id,
        endpoint.name(),
        state.config.gemini_model,
        prompt.chars().count()
    );

    match provider.generate(&state.config.gemini_model, prompt).await {
        Ok(response) => {
            debug!(
                "[{}] {} answered with {} chars",
                request_id,
                endpoint.name(),
                response.text.len()
            );
            Ok(endpoint.respond(&response.text))
        }
        Err(e) => {
            error!(
                "[{}] {} provider error (upstream status {:?}): {}",
                request_id,
                endpoint.name(),
                e.status(),
                e
            );
            Err(RelayError::Provider {
                message: endpoint.failure_message(),
                details: state.config.expose_error_details.then(|| e.to_string()),
            })
        }
    }
}

/// GET / - Root endpoint
async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "message": "Budget Advisor Prompt Relay",
        "status": "running",
        "mode": state.config.mode.as_str(),
        "endpoints": {
            "analyze": state.config.route_path(route::ANALYZE),
            "quote": state.config.route_path(route::QUOTE),
            "health": route::HEALTH,
        },
    }))
}

/// GET /health - Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "provider_configured": state.provider.is_some(),
        "provider": state.provider.as_ref().map(|p| p.provider_name().to_string()),
        "model": state.config.gemini_model,
        "mode": state.config.mode.as_str(),
    }))
}
