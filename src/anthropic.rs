use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use reqwest::Client;
use tracing::{debug, error, info};

use crate::{
    config::ProxyConfig,
    encoder::{split_data_uri, BlockKind, EncodeError},
    models::{DocumentPayload, Usage},
};

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Non-2xx from the generation API, relayed as-is.
    #[error("{message}")]
    Http { status: u16, message: String, details: Value },
    #[error("Upstream request failed: {0}")]
    Transport(String),
    #[error("Unexpected response format")]
    UnexpectedFormat,
}

// Keeps request logs readable when documents are embedded
fn truncate_base64_in_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" {
                    if let Value::String(s) = val {
                        if s.len() > 100 && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=') {
                            *val = Value::String(format!("{}...[truncated {} chars]", &s[..50], s.len() - 50));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Base64Source {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub media_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Document { source: Base64Source },
    Image { source: Base64Source },
    Text { text: String },
}

/// Re-encodes each document as a base64 block (PDF → document, anything
/// else → image) and appends the prompt as the trailing text block.
pub fn build_content(documents: &[DocumentPayload], user_prompt: &str) -> Result<Vec<ContentBlock>, EncodeError> {
    let mut content = Vec::with_capacity(documents.len() + 1);
    for (index, doc) in documents.iter().enumerate() {
        let (embedded, payload) = split_data_uri(&doc.data)?;
        if !embedded.eq_ignore_ascii_case(doc.mime_type.trim()) {
            return Err(EncodeError::MimeMismatch { declared: doc.mime_type.clone(), embedded: embedded.to_string() });
        }
        debug!("Document {}: type={} base64_len={}", index + 1, doc.mime_type, payload.len());
        let source = Base64Source {
            kind: "base64",
            media_type: doc.mime_type.clone(),
            data: payload.to_string(),
        };
        let block = match BlockKind::for_mime(&doc.mime_type) {
            Ok(BlockKind::Document) => ContentBlock::Document { source },
            _ => ContentBlock::Image { source },
        };
        content.push(block);
    }
    content.push(ContentBlock::Text { text: user_prompt.to_string() });
    Ok(content)
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

pub struct AnthropicClient {
    client: Client,
    url: String,
    model: String,
    max_tokens: u32,
    api_version: String,
}

impl AnthropicClient {
    pub fn new(config: &ProxyConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: config.messages_url(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_version: config.api_version.clone(),
        })
    }

    /// One messages call. `api_key` goes into the `x-api-key` header only.
    pub async fn create_message(
        &self,
        api_key: &str,
        system: &str,
        content: Vec<ContentBlock>,
    ) -> Result<Completion, UpstreamError> {
        let request_body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: 1.0,
            system,
            messages: vec![Message { role: "user", content }],
        };

        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(mut logged) = serde_json::to_value(&request_body) {
                truncate_base64_in_json(&mut logged);
                debug!("📤 Request body: {}", logged);
            }
        }
        info!("🔗 Calling generation API: model={} url={}", self.model, self.url);

        let response = self.client
            .post(&self.url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.api_version)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        let response_text = response.text().await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!("❌ API error response: {}", response_text);
            return Err(upstream_http_error(status.as_u16(), &response_text));
        }

        parse_completion(&response_text)
    }
}

fn upstream_http_error(status: u16, body: &str) -> UpstreamError {
    let details: Value = serde_json::from_str(body).unwrap_or_else(|_| Value::Object(Default::default()));
    let message = details
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("API request failed")
        .to_string();
    UpstreamError::Http { status, message, details }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    usage: Option<UpstreamUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct UpstreamUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// First content block's text plus token counts; any other shape is
/// `UnexpectedFormat`.
fn parse_completion(body: &str) -> Result<Completion, UpstreamError> {
    let parsed: MessagesResponse = serde_json::from_str(body).map_err(|e| {
        error!("❌ Unparseable completion: {}", e);
        UpstreamError::UnexpectedFormat
    })?;
    let text = parsed
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or(UpstreamError::UnexpectedFormat)?;
    let usage = parsed.usage.unwrap_or_default();
    info!("✅ Completion received ({} chars)", text.len());
    Ok(Completion {
        text,
        usage: Usage { input_tokens: usage.input_tokens, output_tokens: usage.output_tokens },
    })
}
