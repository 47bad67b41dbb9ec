//! Text generation providers.
//!
//! Every language-model call goes through [`TextGenerator`]. Providers are
//! registered in a [`GeneratorRegistry`] and picked per request from the
//! `modeltype` hint, falling back to the configured default.

mod error;
pub mod openai;
pub mod watsonx;

pub use error::GenerationError;
pub use openai::OpenAiGenerator;
pub use watsonx::WatsonxGenerator;

use crate::config::GenerationConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Produces text from a role instruction and a user prompt.
///
/// Each call is independent; no conversation state is kept.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, role: &str, prompt: &str) -> Result<String, GenerationError>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

/// Known provider families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Watsonx,
}

impl Provider {
    /// Map a free-form hint such as `gpt-4o` or `ibm-granite` to a provider.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_ascii_lowercase();
        if hint.contains("gpt") || hint.contains("openai") {
            Some(Provider::OpenAi)
        } else if hint.contains("ibm") || hint.contains("watsonx") {
            Some(Provider::Watsonx)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Watsonx => "watsonx",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered generators and the selection policy.
#[derive(Clone)]
pub struct GeneratorRegistry {
    generators: HashMap<Provider, Arc<dyn TextGenerator>>,
    default_provider: Provider,
    timeout: Duration,
}

impl GeneratorRegistry {
    pub fn new(default_provider: Provider, timeout: Duration) -> Self {
        Self {
            generators: HashMap::new(),
            default_provider,
            timeout,
        }
    }

    pub fn with_generator(mut self, provider: Provider, generator: Arc<dyn TextGenerator>) -> Self {
        self.generators.insert(provider, generator);
        self
    }

    /// Build clients for every provider whose API key is present.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let default_provider =
            Provider::from_hint(&config.default_provider).unwrap_or(Provider::OpenAi);
        let mut registry = Self::new(default_provider, Duration::from_millis(config.timeout_ms));

        match OpenAiGenerator::from_config(&config.openai, registry.timeout) {
            Ok(Some(generator)) => {
                registry = registry.with_generator(Provider::OpenAi, Arc::new(generator));
            }
            Ok(None) => tracing::info!(
                env = %config.openai.api_key_env,
                "OpenAI provider disabled: API key not set"
            ),
            Err(e) => tracing::warn!(error = %e, "OpenAI provider disabled"),
        }

        match WatsonxGenerator::from_config(&config.watsonx, registry.timeout) {
            Ok(Some(generator)) => {
                registry = registry.with_generator(Provider::Watsonx, Arc::new(generator));
            }
            Ok(None) => tracing::info!(
                env = %config.watsonx.api_key_env,
                "watsonx provider disabled: API key or project id not set"
            ),
            Err(e) => tracing::warn!(error = %e, "watsonx provider disabled"),
        }

        tracing::info!(
            default = %registry.default_provider,
            providers = ?registry.providers(),
            timeout_ms = config.timeout_ms,
            "Text generation configured"
        );
        registry
    }

    pub fn default_provider(&self) -> Provider {
        self.default_provider
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<_> = self.generators.keys().copied().collect();
        providers.sort_by_key(|p| p.as_str());
        providers
    }

    /// Resolve a hint to a registered generator.
    pub fn select(&self, hint: Option<&str>) -> Result<Arc<dyn TextGenerator>, GenerationError> {
        let provider = hint
            .and_then(Provider::from_hint)
            .unwrap_or(self.default_provider);
        self.generators
            .get(&provider)
            .cloned()
            .ok_or_else(|| GenerationError::NotConfigured(provider.to_string()))
    }

    /// Generate text with the selected provider under the configured timeout.
    pub async fn generate(
        &self,
        hint: Option<&str>,
        role: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let generator = self.select(hint)?;
        tracing::debug!(provider = generator.name(), prompt_len = prompt.len(), "Generating text");

        let result = match tokio::time::timeout(self.timeout, generator.generate(role, prompt)).await
        {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.timeout)),
        };

        match &result {
            Ok(text) => {
                tracing::debug!(provider = generator.name(), len = text.len(), "Generation complete")
            }
            Err(e) => tracing::warn!(
                provider = generator.name(),
                upstream = e.is_upstream(),
                error = %e,
                "Generation failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        text: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn generate(&self, _role: &str, _prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.to_string())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct Slow;

    #[async_trait]
    impl TextGenerator for Slow {
        async fn generate(&self, _role: &str, _prompt: &str) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn fixed(text: &'static str) -> Arc<Fixed> {
        Arc::new(Fixed {
            text,
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn hints_map_to_providers() {
        assert_eq!(Provider::from_hint("gpt-4o"), Some(Provider::OpenAi));
        assert_eq!(Provider::from_hint("OpenAI"), Some(Provider::OpenAi));
        assert_eq!(Provider::from_hint("ibm"), Some(Provider::Watsonx));
        assert_eq!(Provider::from_hint("watsonx"), Some(Provider::Watsonx));
        assert_eq!(Provider::from_hint("llama"), None);
    }

    #[tokio::test]
    async fn select_uses_hint_then_default() {
        let gpt = fixed("from gpt");
        let ibm = fixed("from ibm");
        let registry = GeneratorRegistry::new(Provider::Watsonx, Duration::from_secs(1))
            .with_generator(Provider::OpenAi, gpt.clone())
            .with_generator(Provider::Watsonx, ibm.clone());

        let text = registry.generate(Some("gpt"), "r", "p").await.unwrap();
        assert_eq!(text, "from gpt");

        let text = registry.generate(None, "r", "p").await.unwrap();
        assert_eq!(text, "from ibm");

        let text = registry.generate(Some("unknown"), "r", "p").await.unwrap();
        assert_eq!(text, "from ibm");

        assert_eq!(gpt.calls.load(Ordering::SeqCst), 1);
        assert_eq!(ibm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unregistered_provider_is_not_configured() {
        let registry = GeneratorRegistry::new(Provider::OpenAi, Duration::from_secs(1))
            .with_generator(Provider::OpenAi, fixed("x"));
        let err = registry.generate(Some("ibm"), "r", "p").await.unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured(ref p) if p == "watsonx"));
    }

    #[tokio::test]
    async fn slow_generator_times_out() {
        let registry = GeneratorRegistry::new(Provider::OpenAi, Duration::from_millis(20))
            .with_generator(Provider::OpenAi, Arc::new(Slow));
        let err = registry.generate(None, "r", "p").await.unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(_)));
    }
}
