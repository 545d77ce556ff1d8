//! Streaming relay integration tests
//!
//! Verifies fragment ordering, cancellation, timeouts and breaker
//! accounting of streamed completions.

#[cfg(test)]
mod tests {
    use crate::common::assertions::assert_circuit_open;
    use crate::common::fixtures::config_for;
    use crate::common::{Harness, RequestFactory, ScriptedProvider};
    use futures::StreamExt;
    use llm_gateway::core::types::FinishReason;
    use llm_gateway::{CircuitState, GatewayError, RequestContext, StreamEvent};
    use std::time::Duration;

    fn five_fragments() -> ScriptedProvider {
        ScriptedProvider::new("claude")
            .fragments(&["one ", "two ", "three ", "four ", "five"], Duration::from_millis(100))
    }

    /// One fragment a second for far longer than any deadline under test
    fn slow_forty(name: &str) -> ScriptedProvider {
        let texts: Vec<String> = (0..40).map(|i| format!("f{} ", i)).collect();
        let fragments: Vec<&str> = texts.iter().map(String::as_str).collect();
        ScriptedProvider::new(name).fragments(&fragments, Duration::from_secs(1))
    }

    fn harness_with_deadline(
        provider: &ScriptedProvider,
        overall_timeout: u64,
        channel_capacity: usize,
    ) -> Harness {
        let mut config = config_for(std::slice::from_ref(provider));
        config.gateway.streaming.overall_timeout = overall_timeout;
        config.gateway.streaming.channel_capacity = channel_capacity;
        Harness::with_config(config, vec![provider.clone()])
    }

    // ==================== Delivery ====================

    /// Fragments arrive in provider order followed by exactly one Done
    #[tokio::test(start_paused = true)]
    async fn test_full_stream_delivers_fragments_then_done() {
        let claude = ScriptedProvider::new("claude")
            .fragments(&["Hel", "lo", " world"], Duration::from_millis(10));
        let harness = Harness::new(vec![claude.clone()]);

        let stream = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "hi"))
            .await
            .unwrap();
        assert_eq!(stream.provider(), "claude");
        let events: Vec<StreamEvent> = stream.collect().await;

        assert_eq!(events.len(), 4);
        let text: String = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Fragment(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Hello world");
        match &events[3] {
            StreamEvent::Done {
                finish_reason,
                usage,
            } => {
                assert_eq!(*finish_reason, FinishReason::Stop);
                assert!(usage.output_tokens > 0);
                assert_eq!(usage.total_tokens, usage.input_tokens + usage.output_tokens);
            }
            other => panic!("expected Done, got {:?}", other),
        }

        assert!(claude.stream_finished());
        let metrics = harness.breaker("claude").metrics();
        assert_eq!(metrics.total_calls, 1);
        assert_eq!(metrics.failed_calls, 0);
    }

    /// Streams never consult or populate the response cache
    #[tokio::test(start_paused = true)]
    async fn test_streams_bypass_cache() {
        let claude = ScriptedProvider::new("claude").fragments(&["a"], Duration::from_millis(1));
        let harness = Harness::new(vec![claude.clone()]);
        let request = RequestFactory::streaming("claude", "hi");

        for _ in 0..2 {
            let stream = harness
                .relay()
                .stream(&RequestContext::new(), &request)
                .await
                .unwrap();
            let _: Vec<_> = stream.collect().await;
        }
        assert_eq!(claude.stream_calls(), 2);
        assert_eq!(harness.service().cache().stats().await.stores, 0);
    }

    // ==================== Cancellation ====================

    /// Cancelling after two of five fragments stops delivery, reaches the
    /// provider, and records neither success nor failure
    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_stream() {
        let claude = five_fragments();
        let harness = Harness::new(vec![claude.clone()]);

        let mut stream = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "count"))
            .await
            .unwrap();

        assert!(matches!(stream.next().await, Some(StreamEvent::Fragment(t)) if t == "one "));
        assert!(matches!(stream.next().await, Some(StreamEvent::Fragment(t)) if t == "two "));

        stream.cancel();
        assert!(stream.next().await.is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(claude.stream_dropped());
        assert!(!claude.stream_finished());

        let metrics = harness.breaker("claude").metrics();
        assert_eq!(metrics.total_calls, 0);
        assert_eq!(metrics.failed_calls, 0);
        assert_eq!(metrics.state, CircuitState::Closed);
    }

    /// A cancel handle works from another task
    #[tokio::test(start_paused = true)]
    async fn test_cancel_handle_from_another_task() {
        let claude = five_fragments();
        let harness = Harness::new(vec![claude.clone()]);

        let mut stream = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "count"))
            .await
            .unwrap();
        let handle = stream.cancel_handle();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            handle.cancel();
        });

        let mut received = 0;
        while let Some(event) = stream.next().await {
            assert!(matches!(event, StreamEvent::Fragment(_)));
            received += 1;
        }
        assert_eq!(received, 1);
    }

    /// Dropping the stream cancels the upstream call
    #[tokio::test(start_paused = true)]
    async fn test_dropping_stream_cancels_upstream() {
        let claude = five_fragments();
        let harness = Harness::new(vec![claude.clone()]);

        let mut stream = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "count"))
            .await
            .unwrap();
        stream.next().await;
        drop(stream);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(claude.stream_dropped());
        assert!(!claude.stream_finished());
    }

    /// A cancelled half-open trial hands its permit back
    #[tokio::test(start_paused = true)]
    async fn test_cancelled_trial_releases_half_open_permit() {
        let claude = five_fragments();
        let harness = Harness::new(vec![claude.clone()]);
        harness.trip_breaker("claude");
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(harness.breaker("claude").metrics().half_open_permits_remaining, 3);

        let mut stream = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "count"))
            .await
            .unwrap();
        stream.next().await;
        assert_eq!(harness.breaker("claude").metrics().half_open_permits_remaining, 2);

        stream.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let metrics = harness.breaker("claude").metrics();
        assert_eq!(metrics.state, CircuitState::HalfOpen);
        assert_eq!(metrics.half_open_permits_remaining, 3);
    }

    // ==================== Failures ====================

    /// No fragment within the idle timeout ends the stream with an error
    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_ends_stream_with_error() {
        let claude = five_fragments().stall_after(1);
        let harness = Harness::new(vec![claude.clone()]);

        let stream = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "count"))
            .await
            .unwrap();
        let events: Vec<StreamEvent> = stream.collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StreamEvent::Fragment(_)));
        assert!(matches!(events[1], StreamEvent::Error(GatewayError::Timeout(_))));
        assert_eq!(harness.breaker("claude").metrics().failed_calls, 1);
    }

    /// Fragments inside the idle window still stop at the overall deadline
    #[tokio::test(start_paused = true)]
    async fn test_overall_timeout_ends_steady_stream() {
        let claude = slow_forty("claude");
        let harness = harness_with_deadline(&claude, 5, 64);

        let stream = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "count"))
            .await
            .unwrap();
        let events: Vec<StreamEvent> = stream.collect().await;

        let fragments = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::Fragment(_)))
            .count();
        assert!((1..=5).contains(&fragments), "got {} fragments", fragments);
        assert!(matches!(
            events.last(),
            Some(StreamEvent::Error(GatewayError::Timeout(_)))
        ));
        assert!(claude.stream_dropped());
        assert!(!claude.stream_finished());
        assert_eq!(harness.breaker("claude").metrics().failed_calls, 1);
    }

    /// A caller that stops reading cannot hold the upstream past the deadline
    #[tokio::test(start_paused = true)]
    async fn test_overall_timeout_applies_while_reader_stalls() {
        let claude = slow_forty("claude");
        let harness = harness_with_deadline(&claude, 5, 1);

        let stream = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "count"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(claude.stream_dropped());
        assert!(!claude.stream_finished());
        let metrics = harness.breaker("claude").metrics();
        assert_eq!(metrics.failed_calls, 1);
        assert_eq!(metrics.total_calls, 1);

        // Buffered fragments are still delivered, then the timeout
        let events: Vec<StreamEvent> = stream.collect().await;
        assert!(matches!(events.first(), Some(StreamEvent::Fragment(t)) if t == "f0 "));
        assert!(matches!(
            events.last(),
            Some(StreamEvent::Error(GatewayError::Timeout(_)))
        ));
    }

    /// A stalled reader on a half-open trial gives the slot back as a failure
    #[tokio::test(start_paused = true)]
    async fn test_stalled_half_open_trial_reopens_at_deadline() {
        let claude = slow_forty("claude");
        let harness = harness_with_deadline(&claude, 5, 1);
        harness.trip_breaker("claude");
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(harness.breaker("claude").state(), CircuitState::HalfOpen);

        let _stream = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "count"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(harness.breaker("claude").state(), CircuitState::Open);
        assert!(claude.stream_dropped());
    }

    /// A broken upstream stream surfaces as a terminal error event
    #[tokio::test(start_paused = true)]
    async fn test_upstream_failure_mid_stream() {
        let claude = five_fragments().fail_stream_after(2);
        let harness = Harness::new(vec![claude.clone()]);

        let stream = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "count"))
            .await
            .unwrap();
        let events: Vec<StreamEvent> = stream.collect().await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], StreamEvent::Error(GatewayError::Provider(_))));
        assert_eq!(harness.breaker("claude").metrics().failed_calls, 1);
    }

    /// A stream the upstream refuses fails before any event
    #[tokio::test(start_paused = true)]
    async fn test_rejected_stream_fails_to_open() {
        let claude = ScriptedProvider::new("claude").reject_streams();
        let harness = Harness::new(vec![claude.clone()]);

        let result = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "hi"))
            .await;
        assert!(matches!(result, Err(GatewayError::Provider(_))));
        assert_eq!(harness.breaker("claude").metrics().failed_calls, 1);
    }

    /// An open breaker rejects the stream without contacting the provider
    #[tokio::test(start_paused = true)]
    async fn test_open_circuit_rejects_stream() {
        let claude = five_fragments();
        let harness = Harness::new(vec![claude.clone()]);
        harness.trip_breaker("claude");

        let result = harness
            .relay()
            .stream(&RequestContext::new(), &RequestFactory::streaming("claude", "hi"))
            .await;
        assert_circuit_open(&result, "claude");
        assert_eq!(claude.stream_calls(), 0);
    }
}
