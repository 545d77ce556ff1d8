//! Provider test utilities
//!
//! [`ScriptedProvider`] implements the provider trait entirely in process.
//! Replies, failures, delays and stream fragments are scripted up front and
//! every call is counted, so tests can assert what reached the "upstream".

use async_trait::async_trait;
use llm_gateway::core::providers::{HealthStatus, ProviderError};
use llm_gateway::core::traits::{FragmentStream, LLMProvider, ProviderChunk};
use llm_gateway::core::types::{
    CompletionRequest, FinishReason, ProviderCompletion, RequestContext, TokenUsage,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

/// One scripted answer to a non-streaming call
#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Fail(ProviderError),
}

#[derive(Debug)]
struct Script {
    steps: Mutex<VecDeque<Step>>,
    default_reply: String,
    usage: Option<TokenUsage>,
    delay: Duration,
    fragments: Vec<String>,
    fragment_delay: Duration,
    stall_after: Option<usize>,
    fail_after: Option<usize>,
    reject_stream: bool,
    health: Mutex<HealthStatus>,
    calls: AtomicU32,
    stream_calls: AtomicU32,
    stream_dropped: Arc<AtomicBool>,
    stream_finished: Arc<AtomicBool>,
}

/// In-process provider driven by a script.
///
/// Clones share the script and counters, so a test keeps one clone and hands
/// the other to the gateway.
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    name: String,
    models: Vec<String>,
    script: Arc<Script>,
}

impl ScriptedProvider {
    /// Provider serving `<name>-model`, answering "pong" by default
    pub fn new(name: &str) -> Self {
        let model = format!("{}-model", name);
        Self::with_model(name, &model)
    }

    pub fn with_model(name: &str, model: &str) -> Self {
        Self {
            name: name.to_string(),
            models: vec![model.to_string()],
            script: Arc::new(Script {
                steps: Mutex::new(VecDeque::new()),
                default_reply: "pong".to_string(),
                usage: None,
                delay: Duration::ZERO,
                fragments: Vec::new(),
                fragment_delay: Duration::ZERO,
                stall_after: None,
                fail_after: None,
                reject_stream: false,
                health: Mutex::new(HealthStatus::Up),
                calls: AtomicU32::new(0),
                stream_calls: AtomicU32::new(0),
                stream_dropped: Arc::new(AtomicBool::new(false)),
                stream_finished: Arc::new(AtomicBool::new(false)),
            }),
        }
    }

    fn configure(mut self, f: impl FnOnce(&mut Script)) -> Self {
        let script =
            Arc::get_mut(&mut self.script).expect("configure the script before cloning");
        f(script);
        self
    }

    /// Reply used once the scripted steps run out
    pub fn reply(self, content: &str) -> Self {
        let content = content.to_string();
        self.configure(|s| s.default_reply = content)
    }

    /// Token counts reported with every reply
    pub fn reporting_usage(self, input_tokens: u32, output_tokens: u32) -> Self {
        self.configure(|s| {
            s.usage = Some(TokenUsage {
                input_tokens,
                output_tokens,
            })
        })
    }

    /// Latency of every non-streaming call
    pub fn delay(self, delay: Duration) -> Self {
        self.configure(|s| s.delay = delay)
    }

    /// Fragments produced by streaming calls, one every `delay`
    pub fn fragments(self, fragments: &[&str], delay: Duration) -> Self {
        let fragments = fragments.iter().map(|f| f.to_string()).collect();
        self.configure(|s| {
            s.fragments = fragments;
            s.fragment_delay = delay;
        })
    }

    /// Go silent after `count` fragments
    pub fn stall_after(self, count: usize) -> Self {
        self.configure(|s| s.stall_after = Some(count))
    }

    /// Break the stream after `count` fragments
    pub fn fail_stream_after(self, count: usize) -> Self {
        self.configure(|s| s.fail_after = Some(count))
    }

    /// Refuse to open streams
    pub fn reject_streams(self) -> Self {
        self.configure(|s| s.reject_stream = true)
    }

    /// Queue scripted answers, consumed in order before the default reply
    pub fn push(&self, step: Step) {
        self.script.steps.lock().push_back(step);
    }

    pub fn push_failures(&self, count: usize) {
        for _ in 0..count {
            self.push(Step::Fail(ProviderError::api(&self.name, 500, "scripted failure")));
        }
    }

    pub fn push_replies(&self, count: usize) {
        for _ in 0..count {
            self.push(Step::Reply(self.script.default_reply.clone()));
        }
    }

    pub fn set_health(&self, status: HealthStatus) {
        *self.script.health.lock() = status;
    }

    /// Non-streaming calls that reached this provider
    pub fn calls(&self) -> u32 {
        self.script.calls.load(Ordering::SeqCst)
    }

    /// Streaming calls that reached this provider
    pub fn stream_calls(&self) -> u32 {
        self.script.stream_calls.load(Ordering::SeqCst)
    }

    /// Whether the last upstream stream was dropped by the gateway
    pub fn stream_dropped(&self) -> bool {
        self.script.stream_dropped.load(Ordering::SeqCst)
    }

    /// Whether the last upstream stream produced its finish marker
    pub fn stream_finished(&self) -> bool {
        self.script.stream_finished.load(Ordering::SeqCst)
    }

    pub fn model(&self) -> &str {
        &self.models[0]
    }

    pub fn into_adapter(self) -> Arc<dyn LLMProvider> {
        Arc::new(self)
    }
}

/// Sets its flag when the upstream stream is dropped
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn supported_models(&self) -> &[String] {
        &self.models
    }

    fn default_model(&self) -> &str {
        &self.models[0]
    }

    async fn complete(
        &self,
        _ctx: &RequestContext,
        model: &str,
        _request: &CompletionRequest,
    ) -> Result<ProviderCompletion, ProviderError> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        if !self.script.delay.is_zero() {
            tokio::time::sleep(self.script.delay).await;
        }

        let step = self.script.steps.lock().pop_front();
        match step.unwrap_or_else(|| Step::Reply(self.script.default_reply.clone())) {
            Step::Reply(content) => Ok(ProviderCompletion {
                content,
                model: model.to_string(),
                finish_reason: FinishReason::Stop,
                usage: self.script.usage,
            }),
            Step::Fail(error) => Err(error),
        }
    }

    async fn stream_complete(
        &self,
        _ctx: &RequestContext,
        _model: &str,
        _request: &CompletionRequest,
    ) -> Result<FragmentStream, ProviderError> {
        self.script.stream_calls.fetch_add(1, Ordering::SeqCst);
        if self.script.reject_stream {
            return Err(ProviderError::api(&self.name, 503, "stream rejected"));
        }

        self.script.stream_dropped.store(false, Ordering::SeqCst);
        self.script.stream_finished.store(false, Ordering::SeqCst);

        let name = self.name.clone();
        let fragments = self.script.fragments.clone();
        let delay = self.script.fragment_delay;
        let stall_after = self.script.stall_after;
        let fail_after = self.script.fail_after;
        let usage = self.script.usage;
        let flag = DropFlag(Arc::clone(&self.script.stream_dropped));
        let finished = Arc::clone(&self.script.stream_finished);

        let stream = async_stream::stream! {
            let _flag = flag;
            for (index, text) in fragments.into_iter().enumerate() {
                if stall_after == Some(index) {
                    futures::future::pending::<()>().await;
                }
                if fail_after == Some(index) {
                    yield Err(ProviderError::streaming(&name, "connection reset"));
                    return;
                }
                tokio::time::sleep(delay).await;
                yield Ok(ProviderChunk::Delta(text));
            }
            finished.store(true, Ordering::SeqCst);
            yield Ok(ProviderChunk::Finish {
                finish_reason: FinishReason::Stop,
                usage,
            });
        };
        Ok(Box::pin(stream))
    }

    async fn check_health(&self) -> HealthStatus {
        *self.script.health.lock()
    }
}
