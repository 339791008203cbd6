use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    anthropic::{build_content, AnthropicClient, UpstreamError},
    config::ProxyConfig,
    models::{AnalyzeRequest, AnalyzeResponse, ErrorBody},
};

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<AnthropicClient>,
}

impl AppState {
    pub fn new(config: &ProxyConfig) -> Result<Self, UpstreamError> {
        Ok(Self { upstream: Arc::new(AnthropicClient::new(config)?) })
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("API key required")]
    MissingApiKey,
    #[error("{0}")]
    BadRequest(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, details) = match self {
            ProxyError::MissingApiKey | ProxyError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            ProxyError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, None),
            ProxyError::Upstream(UpstreamError::Http { status, details, .. }) => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                Some(details),
            ),
            ProxyError::Upstream(UpstreamError::Transport(_) | UpstreamError::UnexpectedFormat) => {
                (StatusCode::BAD_GATEWAY, None)
            }
        };
        (status, Json(ErrorBody { error: message, details })).into_response()
    }
}

pub fn router(state: AppState, config: &ProxyConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/analyze-document",
            post(analyze_document).options(preflight).fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "homellm-proxy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// OPTIONS without CORS request headers; real preflights are answered by the CORS layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

/// POST /api/analyze-document
pub async fn analyze_document(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ProxyError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!("Rejected request body: {}", rejection.body_text());
        ProxyError::BadRequest(rejection.body_text())
    })?;

    let api_key = body
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(ProxyError::MissingApiKey)?;

    info!(
        documents = body.documents.len(),
        system_prompt_len = body.system_prompt.len(),
        user_prompt_len = body.user_prompt.len(),
        "Analyzing document"
    );

    let content = build_content(&body.documents, &body.user_prompt)
        .map_err(|e| ProxyError::BadRequest(e.to_string()))?;

    let completion = state
        .upstream
        .create_message(api_key, &body.system_prompt, content)
        .await
        .map_err(|e| {
            warn!("Generation failed: {}", e);
            ProxyError::from(e)
        })?;

    Ok(Json(AnalyzeResponse::success(completion.text, completion.usage)))
}
