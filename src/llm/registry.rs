use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AppConfig, LlmConfig};
use crate::errors::{DroidClawError, DroidClawResult};
use crate::llm::provider::LlmProvider;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::llm::types::CallConfig;

/// Registry of all available LLM providers, keyed by their config.toml identifier.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    active: String,
    /// Kept for role-to-model lookups (does not need to be mutable after init).
    llm_config: LlmConfig,
}

impl ProviderRegistry {
    pub fn new(active: String) -> Self {
        Self {
            providers: HashMap::new(),
            active,
            llm_config: LlmConfig::default(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get_active(&self) -> DroidClawResult<Arc<dyn LlmProvider>> {
        self.providers
            .get(&self.active)
            .cloned()
            .ok_or_else(|| DroidClawError::Config(format!("Active provider '{}' not found in registry", self.active)))
    }

    /// Return the provider and call configuration for the tool-calling role.
    ///
    /// Resolution order:
    /// 1. `[llm.roles.tools]` in config.toml
    /// 2. Fallback: active provider with its default model / temperature, non-streaming
    pub fn tools_call_config(&self) -> DroidClawResult<(Arc<dyn LlmProvider>, CallConfig)> {
        if let Some(entry) = self.llm_config.roles.tools.as_ref() {
            let provider = self.providers.get(&entry.provider).cloned().ok_or_else(|| {
                DroidClawError::Config(format!(
                    "Role 'tools' references unknown provider '{}'",
                    entry.provider
                ))
            })?;
            let temperature = entry.temperature.unwrap_or_else(|| {
                self.llm_config
                    .providers
                    .get(&entry.provider)
                    .map(|p| p.temperature)
                    .unwrap_or(0.1)
            });
            tracing::debug!(
                provider = %entry.provider,
                model = %entry.model,
                stream = entry.stream,
                temperature = temperature,
                "resolved tools role config"
            );
            return Ok((provider, CallConfig {
                model: entry.model.clone(),
                stream: entry.stream,
                temperature,
            }));
        }

        let provider = self.get_active()?;
        let entry = self.llm_config.providers.get(&self.active);
        let (model, temperature) = entry
            .map(|p| (p.model.clone(), p.temperature))
            .unwrap_or_else(|| (String::new(), 0.1));
        tracing::debug!(
            provider = %self.active,
            model = %model,
            "tools role not configured, using active provider fallback"
        );
        Ok((provider, CallConfig { model, stream: false, temperature }))
    }

    /// Build a registry from the loaded app config.
    /// API keys are read from environment variables named `DROIDCLAW_<ID>_API_KEY`.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
            active: config.llm.active_provider.clone(),
            llm_config: config.llm.clone(),
        };
        for (id, entry) in &config.llm.providers {
            let api_key = std::env::var(format!("DROIDCLAW_{}_API_KEY", id.to_uppercase()))
                .unwrap_or_else(|_| entry.api_key.clone().unwrap_or_default());
            let provider = OpenAiCompatibleProvider::new(
                id.clone(),
                entry.api_base.clone(),
                api_key,
            );
            registry.register(Arc::new(provider));
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const CONFIG: &str = r#"
        [llm]
        active_provider = "openai"

        [llm.providers.openai]
        display_name = "OpenAI"
        api_base = "https://api.openai.com/v1/chat/completions"
        model = "gpt-4o"
        temperature = 0.3

        [llm.providers.local]
        display_name = "Local"
        api_base = "http://localhost:8080/v1/chat/completions"
        model = "qwen"
    "#;

    #[test]
    fn falls_back_to_active_provider() {
        let cfg = parse_config(CONFIG).unwrap();
        let registry = ProviderRegistry::from_config(&cfg);
        let (provider, call) = registry.tools_call_config().unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(call.model, "gpt-4o");
        assert_eq!(call.temperature, 0.3);
        assert!(!call.stream);
    }

    #[test]
    fn tools_role_overrides_active_provider() {
        let text = format!(
            "{CONFIG}\n[llm.roles.tools]\nprovider = \"local\"\nmodel = \"qwen-tools\"\nstream = true\n"
        );
        let cfg = parse_config(&text).unwrap();
        let registry = ProviderRegistry::from_config(&cfg);
        let (provider, call) = registry.tools_call_config().unwrap();
        assert_eq!(provider.name(), "local");
        assert_eq!(call.model, "qwen-tools");
        assert_eq!(call.temperature, 0.1);
        assert!(call.stream);
    }

    #[test]
    fn unknown_active_provider_is_config_error() {
        let registry = ProviderRegistry::new("missing".into());
        let err = registry.tools_call_config().err().unwrap();
        assert!(matches!(err, DroidClawError::Config(_)));
    }
}
