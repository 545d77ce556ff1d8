//! Configuration loading integration tests
//!
//! Loads YAML files from disk and builds gateway state from them.

#[cfg(test)]
mod tests {
    use crate::common::fixtures::TWO_PROVIDER_YAML;
    use llm_gateway::server::{AppState, ServerBuilder, load_config};
    use llm_gateway::{CircuitState, Config, GatewayError};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // ==================== Loading ====================

    #[tokio::test]
    async fn test_load_config_file() {
        let file = write_config(TWO_PROVIDER_YAML);
        let config = load_config(Some(file.path())).await.unwrap();

        assert_eq!(config.server().port, 9090);
        assert_eq!(config.providers().len(), 2);
        assert_eq!(config.cache().ttl(), Duration::from_secs(300));
        assert_eq!(config.streaming().idle_timeout(), Duration::from_secs(10));
        assert!(!config.health_check().enabled);

        let claude = config.gateway.get_provider("claude").unwrap();
        assert_eq!(claude.api_key(), Some("sk-ant-test"));
        assert_eq!(claude.model("claude-3-haiku").unwrap().max_output_tokens, 4096);
    }

    #[tokio::test]
    async fn test_state_from_loaded_config() {
        let file = write_config(TWO_PROVIDER_YAML);
        let config = Config::from_file(file.path()).await.unwrap();
        let state = AppState::from_config(config).unwrap();

        let registry = state.completions.registry();
        let names: Vec<String> = registry.list_all().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["claude", "openai"]);
        assert_eq!(registry.list_enabled().len(), 2);

        let breakers = state.completions.breakers();
        assert_eq!(breakers.state("claude"), Some(CircuitState::Closed));
        assert_eq!(breakers.state("openai"), Some(CircuitState::Closed));

        let pricing = state
            .completions
            .estimator()
            .pricing("claude", "claude-3-haiku")
            .unwrap();
        assert_eq!(pricing.input_cost_per_1k_tokens, 0.00025);
        assert!(state.completions.estimator().pricing("openai", "gpt-4o-mini").is_some());
    }

    #[test]
    fn test_per_provider_breaker_override() {
        let yaml = TWO_PROVIDER_YAML.replace(
            "    default_model: gpt-4o-mini\n",
            "    default_model: gpt-4o-mini\n    circuit_breaker:\n      minimum_number_of_calls: 4\n      sliding_window_size: 4\n",
        );
        let config = Config::from_yaml(&yaml).unwrap();
        let state = AppState::from_config(config).unwrap();

        let breakers = state.completions.breakers();
        assert_eq!(
            breakers.get("openai").unwrap().config().minimum_number_of_calls,
            4
        );
        assert_eq!(
            breakers.get("claude").unwrap().config().minimum_number_of_calls,
            10
        );
    }

    #[test]
    fn test_server_builder_with_config() {
        let config = Config::from_yaml(TWO_PROVIDER_YAML).unwrap();
        let server = ServerBuilder::new().with_config(config).build().unwrap();
        assert_eq!(server.config().address(), "127.0.0.1:9090");
        assert_eq!(server.state().completions.registry().len(), 2);
    }

    // ==================== Rejection ====================

    #[tokio::test]
    async fn test_missing_file() {
        let result = load_config(Some(std::path::Path::new("/nonexistent/gateway.yaml"))).await;
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_duplicate_provider_names_rejected() {
        let yaml = TWO_PROVIDER_YAML.replace("name: openai", "name: claude");
        let result = Config::from_yaml(&yaml);
        match result {
            Err(GatewayError::Config(message)) => assert!(message.contains("Duplicate")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_default_model_must_be_listed() {
        let yaml = TWO_PROVIDER_YAML.replace(
            "default_model: gpt-4o-mini",
            "default_model: gpt-4-turbo",
        );
        assert!(matches!(Config::from_yaml(&yaml), Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_out_of_range_breaker_threshold_rejected() {
        let yaml = format!("{}\ncircuit_breaker:\n  failure_rate_threshold: 150\n", TWO_PROVIDER_YAML);
        assert!(matches!(Config::from_yaml(&yaml), Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_idle_timeout_above_overall_rejected() {
        let yaml = TWO_PROVIDER_YAML.replace(
            "  idle_timeout: 10\n",
            "  idle_timeout: 10\n  overall_timeout: 5\n",
        );
        assert!(matches!(Config::from_yaml(&yaml), Err(GatewayError::Config(_))));
    }
}
