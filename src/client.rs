use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::{
    models::{AnalyzeRequest, DocumentPayload, Usage},
    validation::{validate_api_key, ValidationError},
};

pub const ANALYZE_PATH: &str = "/api/analyze-document";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The detail is for logs; users see the fixed message.
    #[error("Network error. Please check your internet connection.")]
    Network(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response format")]
    UnexpectedFormat,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Connection failures, rate limits and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status == 429 || *status >= 500,
            Self::Validation(_) | Self::UnexpectedFormat => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub api_key: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub documents: Vec<DocumentPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub usage: Usage,
}

/// Anything that can turn a prompt plus documents into text. The proxy
/// client is the production implementation; tests substitute their own.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ClientError>;
}

/// Talks to `POST /api/analyze-document`.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    endpoint: String,
}

impl ProxyClient {
    /// `base_url` is the proxy origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self { client, endpoint: format!("{}{}", base_url.trim_end_matches('/'), ANALYZE_PATH) }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct SuccessBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[async_trait]
impl GenerationBackend for ProxyClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ClientError> {
        validate_api_key(&request.api_key)?;

        let body = AnalyzeRequest {
            api_key: Some(request.api_key.trim().to_string()),
            system_prompt: request.system_prompt.clone(),
            user_prompt: request.user_prompt.clone(),
            documents: request.documents.clone(),
        };
        info!(
            "📨 Sending to proxy: documents={} system_prompt_len={} user_prompt_len={}",
            body.documents.len(),
            body.system_prompt.len(),
            body.user_prompt.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| ClientError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("Server error ({})", status.as_u16()));
            error!("❌ Proxy returned {}: {}", status, message);
            return Err(ClientError::Server { status: status.as_u16(), message });
        }

        let parsed: SuccessBody = serde_json::from_slice(&bytes).map_err(|_| ClientError::UnexpectedFormat)?;
        let text = match parsed {
            SuccessBody { success: true, email: Some(text), .. } => text,
            _ => return Err(ClientError::UnexpectedFormat),
        };
        info!("✅ Generated {} chars", text.len());
        Ok(Generation { text, usage: parsed.usage })
    }
}
