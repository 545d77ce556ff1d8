//! HTTP route integration tests
//!
//! Runs the full actix application against scripted providers.

#[cfg(test)]
mod tests {
    use crate::common::{Harness, ScriptedProvider};
    use actix_web::{App, test, web};
    use llm_gateway::server::middleware::RequestIdMiddleware;
    use llm_gateway::server::{AppState, HttpServer};
    use serde_json::{Value, json};
    use std::time::Duration;

    fn data(harness: &Harness) -> web::Data<AppState> {
        web::Data::new(harness.state.clone())
    }

    macro_rules! app {
        ($state:expr) => {{
            let state = $state;
            test::init_service(
                App::new()
                    .wrap(RequestIdMiddleware)
                    .configure(|cfg| HttpServer::configure_app(state.clone(), cfg)),
            )
            .await
        }};
    }

    fn ping_body(provider: &str) -> Value {
        json!({
            "provider": provider,
            "messages": [{"role": "user", "content": "ping"}],
            "maxTokens": 32
        })
    }

    // ==================== Completions ====================

    #[actix_web::test]
    async fn test_completion_endpoint() {
        let claude = ScriptedProvider::with_model("claude", "claude-3-haiku").reply("pong");
        let harness = Harness::new(vec![claude.clone()]);
        let app = app!(data(&harness));

        let req = test::TestRequest::post()
            .uri("/completions")
            .insert_header(("X-Request-Id", "req-1"))
            .set_json(ping_body("claude"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-1");

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["content"], "pong");
        assert_eq!(body["provider"], "claude");
        assert_eq!(body["model"], "claude-3-haiku");
        assert_eq!(body["fromCache"], false);
        assert_eq!(body["finishReason"], "stop");
        assert!(body["usage"]["totalTokens"].as_u64().unwrap() > 0);
        assert_eq!(claude.calls(), 1);

        // Identical request is served from the cache
        let req = test::TestRequest::post()
            .uri("/completions")
            .set_json(ping_body("claude"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["fromCache"], true);
        assert_eq!(claude.calls(), 1);
    }

    #[actix_web::test]
    async fn test_validation_error_body() {
        let harness = Harness::new(vec![ScriptedProvider::new("claude")]);
        let app = app!(data(&harness));

        let req = test::TestRequest::post()
            .uri("/completions")
            .insert_header(("X-Request-Id", "req-bad"))
            .set_json(json!({"messages": [], "maxTokens": 10}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["retryable"], false);
        assert_eq!(body["error"]["request_id"], "req-bad");
    }

    #[actix_web::test]
    async fn test_open_circuit_is_503() {
        let claude = ScriptedProvider::new("claude");
        let harness = Harness::new(vec![claude.clone()]);
        harness.trip_breaker("claude");
        let app = app!(data(&harness));

        let req = test::TestRequest::post()
            .uri("/completions")
            .set_json(ping_body("claude"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 503);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "CIRCUIT_OPEN");
        assert_eq!(body["error"]["retryable"], true);
        assert_eq!(claude.calls(), 0);
    }

    // ==================== Streaming ====================

    #[actix_web::test]
    async fn test_stream_endpoint_emits_sse_frames() {
        let claude = ScriptedProvider::new("claude")
            .fragments(&["Hel", "lo"], Duration::from_millis(1));
        let harness = Harness::new(vec![claude]);
        let app = app!(data(&harness));

        let req = test::TestRequest::post()
            .uri("/completions/stream")
            .set_json(ping_body("claude"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "text/event-stream"
        );

        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        let first = text.find(r#"data: {"content":"Hel"}"#).unwrap();
        let second = text.find(r#"data: {"content":"lo"}"#).unwrap();
        let done = text.find("event: done").unwrap();
        assert!(first < second && second < done);
        assert!(text.contains(r#""finishReason":"stop""#));
        assert!(!text.contains("event: error"));
    }

    #[actix_web::test]
    async fn test_stream_endpoint_reports_open_failure_as_http_error() {
        let claude = ScriptedProvider::new("claude").reject_streams();
        let harness = Harness::new(vec![claude]);
        let app = app!(data(&harness));

        let req = test::TestRequest::post()
            .uri("/completions/stream")
            .set_json(ping_body("claude"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 502);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "PROVIDER_ERROR");
    }

    // ==================== Providers ====================

    #[actix_web::test]
    async fn test_list_and_get_providers() {
        let harness = Harness::new(vec![
            ScriptedProvider::new("claude"),
            ScriptedProvider::new("openai"),
        ]);
        harness.trip_breaker("openai");
        let app = app!(data(&harness));

        let req = test::TestRequest::get().uri("/providers").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let providers = body.as_array().unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0]["name"], "claude");
        assert_eq!(providers[0]["priority"], 1);
        assert_eq!(providers[0]["circuit_state"], "CLOSED");
        assert_eq!(providers[1]["circuit_state"], "OPEN");

        let req = test::TestRequest::get().uri("/providers/claude").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["default_model"], "claude-model");
        assert_eq!(body["models"][0]["max_output_tokens"], 4096);
    }

    #[actix_web::test]
    async fn test_manual_half_open_transition() {
        let harness = Harness::new(vec![ScriptedProvider::new("claude")]);
        harness.trip_breaker("claude");
        let app = app!(data(&harness));

        let req = test::TestRequest::post()
            .uri("/providers/claude/circuit/half-open")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["transitioned"], true);
        assert_eq!(body["circuit_state"], "HALF_OPEN");

        // Already half-open: nothing to do
        let req = test::TestRequest::post()
            .uri("/providers/claude/circuit/half-open")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["transitioned"], false);
    }

    // ==================== Health and Metrics ====================

    #[actix_web::test]
    async fn test_metrics_after_traffic() {
        let claude = ScriptedProvider::new("claude");
        let harness = Harness::new(vec![claude]);
        let app = app!(data(&harness));

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/completions")
                .set_json(ping_body("claude"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["providers"]["claude"]["requests"], 2);
        assert_eq!(body["providers"]["claude"]["successes"], 1);
        assert_eq!(body["providers"]["claude"]["cache_hits"], 1);
        assert_eq!(body["cache"]["hits"], 1);
        assert_eq!(body["circuits"]["claude"]["state"], "CLOSED");
        assert_eq!(body["circuits"]["claude"]["total_calls"], 1);
    }

    #[actix_web::test]
    async fn test_health_counts_providers() {
        let harness = Harness::new(vec![
            ScriptedProvider::new("claude"),
            ScriptedProvider::new("openai"),
        ]);
        let app = app!(data(&harness));

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["providers"], 2);
        assert_eq!(body["enabled_providers"], 2);
    }
}
