//! OpenAI provider implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::DEFAULT_BASE_URL;
use super::streaming::fragment_stream;
use crate::config::ProviderConfig;
use crate::core::providers::http::{build_client, endpoint, ensure_success, transport_error};
use crate::core::providers::{HealthStatus, ProviderError};
use crate::core::traits::{FragmentStream, LLMProvider};
use crate::core::types::{
    CompletionRequest, FinishReason, MessageRole, ProviderCompletion, RequestContext, TokenUsage,
};

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    name: String,
    api_key: Option<String>,
    base_url: String,
    enabled: bool,
    models: Vec<String>,
    default_model: String,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            name: config.name.clone(),
            api_key: config.api_key().map(str::to_string),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            enabled: config.enabled,
            models: config.models.iter().map(|m| m.name.clone()).collect(),
            default_model: config.default_model.clone(),
            client: build_client(&config.name)?,
        })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderError::authentication(&self.name, "API key is not configured"))
    }

    async fn post_chat(&self, body: &Value) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, "/chat/completions"))
            .bearer_auth(self.api_key()?)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(&self.name, e))?;
        ensure_success(&self.name, response).await
    }
}

/// Chat completions request body.
///
/// The system prompt becomes the leading system message. `top_k` has no
/// counterpart in this API and is dropped.
pub(crate) fn build_request_body(model: &str, request: &CompletionRequest, stream: bool) -> Value {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = request.system_prompt.as_deref() {
        messages.push(json!({"role": MessageRole::System.as_str(), "content": system}));
    }
    for message in &request.messages {
        messages.push(json!({"role": message.role.as_str(), "content": message.content}));
    }

    let mut body = json!({
        "model": model,
        "messages": messages,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(top_p) = request.top_p {
        body["top_p"] = json!(top_p);
    }
    if !request.stop.is_empty() {
        body["stop"] = json!(request.stop);
    }
    if stream {
        body["stream"] = json!(true);
        body["stream_options"] = json!({"include_usage": true});
    }
    body
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
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
        debug!(request_id = %ctx.request_id, provider = %self.name, model, "Sending OpenAI request");
        let body = build_request_body(model, request, false);
        let response = self.post_chat(&body).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parsing(&self.name, format!("Failed to parse JSON: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::parsing(&self.name, "Response contained no choices"))?;

        Ok(ProviderCompletion {
            content: choice.message.content.unwrap_or_default(),
            model: parsed.model,
            finish_reason: FinishReason::from_provider(choice.finish_reason.as_deref()),
            usage: parsed.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }

    async fn stream_complete(
        &self,
        ctx: &RequestContext,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<FragmentStream, ProviderError> {
        debug!(request_id = %ctx.request_id, provider = %self.name, model, "Opening OpenAI stream");
        let body = build_request_body(model, request, true);
        let response = self.post_chat(&body).await?;
        Ok(fragment_stream(self.name.clone(), response))
    }

    async fn check_health(&self) -> HealthStatus {
        let api_key = match self.api_key() {
            Ok(key) => key,
            Err(_) => return HealthStatus::Down,
        };
        match self
            .client
            .get(endpoint(&self.base_url, "/models"))
            .bearer_auth(api_key)
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
