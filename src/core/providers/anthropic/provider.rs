//! Anthropic provider implementation

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::streaming::fragment_stream;
use super::{DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use crate::config::ProviderConfig;
use crate::core::providers::http::{build_client, endpoint, ensure_success, transport_error};
use crate::core::providers::{HealthStatus, ProviderError};
use crate::core::traits::{FragmentStream, LLMProvider};
use crate::core::types::{
    CompletionRequest, FinishReason, MessageRole, ProviderCompletion, RequestContext, TokenUsage,
};

/// Fallback output bound; the Messages API requires `max_tokens`
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Anthropic provider
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    name: String,
    api_key: Option<String>,
    base_url: String,
    api_version: String,
    enabled: bool,
    models: Vec<String>,
    default_model: String,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            name: config.name.clone(),
            api_key: config.api_key().map(str::to_string),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_version: config
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            enabled: config.enabled,
            models: config.models.iter().map(|m| m.name.clone()).collect(),
            default_model: config.default_model.clone(),
            client: build_client(&config.name)?,
        })
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::authentication(&self.name, "API key is not configured"))?;
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|_| ProviderError::authentication(&self.name, "API key is not a valid header value"))?,
        );
        if let Ok(version) = HeaderValue::from_str(&self.api_version) {
            headers.insert("anthropic-version", version);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn post_messages(&self, body: &Value) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, "/v1/messages"))
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(&self.name, e))?;
        ensure_success(&self.name, response).await
    }
}

/// Messages API request body.
///
/// System messages and the system prompt are folded into the top-level
/// `system` field, which is where the API expects them.
pub(crate) fn build_request_body(model: &str, request: &CompletionRequest, stream: bool) -> Value {
    let mut system_parts: Vec<&str> = Vec::new();
    if let Some(system) = request.system_prompt.as_deref() {
        system_parts.push(system);
    }
    let mut messages = Vec::with_capacity(request.messages.len());
    for message in &request.messages {
        match message.role {
            MessageRole::System => system_parts.push(&message.content),
            role => messages.push(json!({
                "role": role.as_str(),
                "content": message.content,
            })),
        }
    }

    let mut body = json!({
        "model": model,
        "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "messages": messages,
    });
    if !system_parts.is_empty() {
        body["system"] = json!(system_parts.join("\n"));
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(top_p) = request.top_p {
        body["top_p"] = json!(top_p);
    }
    if let Some(top_k) = request.top_k {
        body["top_k"] = json!(top_k);
    }
    if !request.stop.is_empty() {
        body["stop_sequences"] = json!(request.stop);
    }
    if stream {
        body["stream"] = json!(true);
    }
    body
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }

    fn supported_models(&self) -> &[String] {
        &self.models
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(
        &self,
        ctx: &RequestContext,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<ProviderCompletion, ProviderError> {
        debug!(request_id = %ctx.request_id, provider = %self.name, model, "Sending Anthropic request");
        let body = build_request_body(model, request, false);
        let response = self.post_messages(&body).await?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parsing(&self.name, format!("Failed to parse JSON: {}", e)))?;

        let content = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<String>();

        Ok(ProviderCompletion {
            content,
            model: parsed.model,
            finish_reason: FinishReason::from_provider(parsed.stop_reason.as_deref()),
            usage: parsed.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }

    async fn stream_complete(
        &self,
        ctx: &RequestContext,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<FragmentStream, ProviderError> {
        debug!(request_id = %ctx.request_id, provider = %self.name, model, "Opening Anthropic stream");
        let body = build_request_body(model, request, true);
        let response = self.post_messages(&body).await?;
        Ok(fragment_stream(self.name.clone(), response))
    }

    async fn check_health(&self) -> HealthStatus {
        let headers = match self.headers() {
            Ok(headers) => headers,
            Err(_) => return HealthStatus::Down,
        };
        match self
            .client
            .get(endpoint(&self.base_url, "/v1/models"))
            .headers(headers)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => HealthStatus::Up,
            Ok(response) => {
                debug!(provider = %self.name, status = %response.status(), "Health probe failed");
                HealthStatus::Down
            }
            Err(e) => {
                debug!(provider = %self.name, error = %e, "Health probe failed");
                HealthStatus::Down
            }
        }
    }
}
