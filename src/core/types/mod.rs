//! Request, response and context types shared by every gateway component

pub mod context;
pub mod request;
pub mod response;

pub use context::RequestContext;
pub use request::{
    ChatMessage, CompletionRequest, DEFAULT_MODEL_ALIAS, MessageRole, assistant_message,
    system_message, user_message,
};
pub use response::{
    CompletionResponse, FinishReason, ProviderCompletion, TokenUsage, Usage,
};
