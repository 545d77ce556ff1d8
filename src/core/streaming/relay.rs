//! Streaming relay
//!
//! One spawned task per stream pulls fragments from the provider and pushes
//! them through a bounded channel. The task watches the caller's cancellation
//! token, an idle timer between fragments and an overall deadline, including
//! while it waits for a slow reader. The terminal event goes through its own
//! slot and never waits on the channel.

use super::types::{CompletionStream, StreamEvent};
use crate::config::StreamingConfig;
use crate::core::circuit_breaker::CallPermit;
use crate::core::completion::{CompletionService, ResolvedRequest};
use crate::core::cost::CostEstimator;
use crate::core::metrics::GatewayMetrics;
use crate::core::providers::ProviderError;
use crate::core::traits::{FragmentStream, ProviderChunk};
use crate::core::types::{CompletionRequest, RequestContext};
use crate::utils::error::{GatewayError, Result};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Relays provider streams to callers
#[derive(Debug, Clone)]
pub struct StreamingRelay {
    service: CompletionService,
    channel_capacity: usize,
    idle_timeout: Duration,
    overall_timeout: Duration,
}

impl StreamingRelay {
    pub fn new(service: CompletionService, config: &StreamingConfig) -> Self {
        Self {
            service,
            channel_capacity: config.channel_capacity.max(1),
            idle_timeout: config.idle_timeout(),
            overall_timeout: config.overall_timeout(),
        }
    }

    /// Open a stream for `request`.
    ///
    /// Validation, selection and breaker rejections fail here without a
    /// stream; failures after the upstream accepted the call arrive as a
    /// terminal [`StreamEvent::Error`]. Streams never touch the cache.
    pub async fn stream(
        &self,
        ctx: &RequestContext,
        request: &CompletionRequest,
    ) -> Result<CompletionStream> {
        let resolved = self.service.resolve(ctx, request)?;
        let provider = resolved.provider_name().to_string();
        let model = resolved.model_name().to_string();
        let metrics = Arc::clone(self.service.metrics());
        metrics.record_request(&provider);
        metrics.record_stream(&provider);

        let breaker = self.service.breakers().get_or_create(&provider);
        let permit = match breaker.try_acquire(ctx) {
            Ok(permit) => permit,
            Err(err) => {
                metrics.record_short_circuit(&provider);
                return Err(err);
            }
        };

        let started = Instant::now();
        let deadline = started + self.overall_timeout;
        let opened = tokio::time::timeout_at(
            deadline,
            resolved
                .selection
                .provider
                .stream_complete(ctx, &model, &resolved.request),
        )
        .await;

        let upstream = match opened {
            Ok(Ok(upstream)) => upstream,
            Ok(Err(error)) => {
                permit.record_failure();
                metrics.record_failure(&provider);
                warn!(request_id = %ctx.request_id, provider = %provider, error = %error, "Failed to open stream");
                return Err(error.into());
            }
            Err(_) => {
                permit.record_failure();
                metrics.record_failure(&provider);
                return Err(ProviderError::timeout(&provider, "stream was not accepted in time").into());
            }
        };

        debug!(request_id = %ctx.request_id, provider = %provider, model = %model, "Stream opened");

        let (sender, receiver) = mpsc::channel(self.channel_capacity);
        let (terminal_tx, terminal_rx) = oneshot::channel();
        let token = CancellationToken::new();
        let task = RelayTask {
            request_id: ctx.request_id.clone(),
            resolved,
            estimator: Arc::clone(self.service.estimator()),
            metrics,
            idle_timeout: self.idle_timeout,
            started,
            deadline,
        };
        tokio::spawn(task.run(upstream, sender, terminal_tx, token.clone(), permit));

        Ok(CompletionStream::new(receiver, token, provider, model).with_terminal(terminal_rx))
    }
}

/// Result of handing one fragment to the caller
enum Delivery {
    Delivered,
    /// Caller cancelled or dropped the stream
    Abandoned,
    /// Overall deadline passed while the caller was not reading
    Expired,
}

struct RelayTask {
    request_id: String,
    resolved: ResolvedRequest,
    estimator: Arc<CostEstimator>,
    metrics: Arc<GatewayMetrics>,
    idle_timeout: Duration,
    started: Instant,
    deadline: Instant,
}

impl RelayTask {
    async fn run(
        self,
        mut upstream: FragmentStream,
        sender: mpsc::Sender<StreamEvent>,
        terminal: oneshot::Sender<StreamEvent>,
        token: CancellationToken,
        permit: CallPermit,
    ) {
        let provider = self.resolved.provider_name();
        let overall = tokio::time::sleep_until(self.deadline);
        tokio::pin!(overall);
        let mut content = String::new();
        let mut fragments = 0usize;

        loop {
            let next: std::result::Result<ProviderChunk, GatewayError> = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    // Dropping the permit records no outcome
                    debug!(request_id = %self.request_id, provider, fragments, "Stream cancelled by caller");
                    return;
                }
                _ = &mut overall => Err(self.overall_timeout()),
                item = tokio::time::timeout(self.idle_timeout, upstream.next()) => match item {
                    Ok(Some(Ok(chunk))) => Ok(chunk),
                    Ok(Some(Err(error))) => Err(error.into()),
                    Ok(None) => Err(ProviderError::streaming(provider, "stream ended without a finish marker").into()),
                    Err(_) => Err(ProviderError::timeout(
                        provider,
                        format!("no fragment for {}s", self.idle_timeout.as_secs()),
                    ).into()),
                },
            };

            match next {
                Ok(ProviderChunk::Delta(text)) => {
                    if text.is_empty() {
                        continue;
                    }
                    content.push_str(&text);
                    fragments += 1;
                    let delivery = tokio::select! {
                        biased;
                        _ = token.cancelled() => Delivery::Abandoned,
                        _ = &mut overall => Delivery::Expired,
                        sent = sender.send(StreamEvent::Fragment(text)) => match sent {
                            Ok(()) => Delivery::Delivered,
                            Err(_) => Delivery::Abandoned,
                        },
                    };
                    match delivery {
                        Delivery::Delivered => {}
                        Delivery::Abandoned => {
                            debug!(request_id = %self.request_id, provider, fragments, "Stream receiver gone");
                            return;
                        }
                        Delivery::Expired => {
                            drop(upstream);
                            self.fail(permit, terminal, &token, fragments, self.overall_timeout());
                            return;
                        }
                    }
                }
                Ok(ProviderChunk::Finish {
                    finish_reason,
                    usage,
                }) => {
                    permit.record_success();
                    let usage = self.resolved.usage(&self.estimator, usage, &content);
                    self.metrics
                        .record_success(provider, self.started.elapsed(), &usage);
                    info!(
                        request_id = %self.request_id,
                        provider,
                        fragments,
                        total_tokens = usage.total_tokens,
                        "Stream finished"
                    );
                    let _ = terminal.send(StreamEvent::Done {
                        finish_reason,
                        usage,
                    });
                    return;
                }
                Err(error) => {
                    drop(upstream);
                    self.fail(permit, terminal, &token, fragments, error);
                    return;
                }
            }
        }
    }

    fn overall_timeout(&self) -> GatewayError {
        ProviderError::timeout(
            self.resolved.provider_name(),
            format!(
                "stream exceeded {}s",
                self.deadline.duration_since(self.started).as_secs()
            ),
        )
        .into()
    }

    fn fail(
        &self,
        permit: CallPermit,
        terminal: oneshot::Sender<StreamEvent>,
        token: &CancellationToken,
        fragments: usize,
        error: GatewayError,
    ) {
        let provider = self.resolved.provider_name();
        permit.record_failure();
        self.metrics.record_failure(provider);
        warn!(request_id = %self.request_id, provider, fragments, error = %error, "Stream failed");
        if !token.is_cancelled() {
            let _ = terminal.send(StreamEvent::Error(error));
        }
    }
}
