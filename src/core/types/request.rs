//! Completion request types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Model name callers may send to ask for the provider's default model
pub const DEFAULT_MODEL_ALIAS: &str = "default";

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role/content pair of the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Create a user message
pub fn user_message(content: impl Into<String>) -> ChatMessage {
    ChatMessage::new(MessageRole::User, content)
}

/// Create a system message
pub fn system_message(content: impl Into<String>) -> ChatMessage {
    ChatMessage::new(MessageRole::System, content)
}

/// Create an assistant message
pub fn assistant_message(content: impl Into<String>) -> ChatMessage {
    ChatMessage::new(MessageRole::Assistant, content)
}

fn default_true() -> bool {
    true
}

/// A normalized completion request as received from calling services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    /// Provider name; selected automatically when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Model name; the provider default is used when absent or `"default"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Ordered prompt messages
    pub messages: Vec<ChatMessage>,
    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    /// Whether the response may be served from / stored into the cache
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            messages: Vec::new(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            top_k: None,
            stream: false,
            system_prompt: None,
            stop: Vec::new(),
            cache_enabled: true,
        }
    }
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_cache(mut self, cache_enabled: bool) -> Self {
        self.cache_enabled = cache_enabled;
        self
    }

    /// Explicitly requested model, `None` when the provider default applies
    pub fn requested_model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty() && !m.eq_ignore_ascii_case(DEFAULT_MODEL_ALIAS))
    }

    /// Explicitly requested provider, if any
    pub fn requested_provider(&self) -> Option<&str> {
        self.provider
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// All prompt text that counts towards the input token estimate
    pub fn prompt_text(&self) -> String {
        let mut text = String::new();
        if let Some(system) = &self.system_prompt {
            text.push_str(system);
            text.push('\n');
        }
        for message in &self.messages {
            text.push_str(&message.content);
            text.push('\n');
        }
        text
    }
}
