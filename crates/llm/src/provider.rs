use longsum_common::{AppConfig, LongsumError, Result};
use std::sync::Arc;

use crate::client::OllamaClient;
use crate::gemini_client::GeminiClient;
use crate::llm_trait::LlmClient;
use crate::openai_client::OpenAiClient;
use crate::retry::RetryPolicy;

/// Model ids with this prefix are served by a local Ollama instance
pub const OLLAMA_PREFIX: &str = "ollama/";

/// Base URLs for each provider
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub openai: String,
    pub gemini: String,
    pub ollama: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        let config = AppConfig::default();
        Self::from(&config)
    }
}

impl From<&AppConfig> for Endpoints {
    fn from(config: &AppConfig) -> Self {
        Self {
            openai: config.openai_base_url.clone(),
            gemini: config.gemini_base_url.clone(),
            ollama: config.ollama_base_url.clone(),
        }
    }
}

/// Provider family of a model identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
    Ollama,
}

impl Provider {
    /// Detect the provider from the model identifier
    pub fn for_model(model: &str) -> Result<Self> {
        if model.starts_with("gpt") {
            Ok(Self::OpenAi)
        } else if model.starts_with("gemini") {
            Ok(Self::Gemini)
        } else if model.starts_with(OLLAMA_PREFIX) && model.len() > OLLAMA_PREFIX.len() {
            Ok(Self::Ollama)
        } else {
            Err(LongsumError::unsupported_model(model))
        }
    }
}

/// Build the completion client for `model`
///
/// Fails with `UnsupportedModel` before any network activity when no
/// provider matches, and with `Config` when a hosted provider has no key.
pub fn client_for_model(
    model: &str,
    api_key: Option<&str>,
    temperature: f32,
    policy: RetryPolicy,
    endpoints: &Endpoints,
) -> Result<Arc<dyn LlmClient>> {
    let require_key = |name: &str| {
        api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LongsumError::config(format!("{} API key is not set", name)))
    };

    let client: Arc<dyn LlmClient> = match Provider::for_model(model)? {
        Provider::OpenAi => Arc::new(OpenAiClient::new(
            &endpoints.openai,
            require_key("OpenAI")?,
            model,
            temperature,
            policy,
        )?),
        Provider::Gemini => Arc::new(GeminiClient::new(
            &endpoints.gemini,
            require_key("Gemini")?,
            model,
            temperature,
            policy,
        )?),
        Provider::Ollama => Arc::new(OllamaClient::new(
            &endpoints.ollama,
            &model[OLLAMA_PREFIX.len()..],
            temperature,
            policy,
        )?),
    };

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_detection() {
        assert_eq!(Provider::for_model("gpt-3.5-turbo").unwrap(), Provider::OpenAi);
        assert_eq!(Provider::for_model("gpt-4o-mini").unwrap(), Provider::OpenAi);
        assert_eq!(Provider::for_model("gemini-pro").unwrap(), Provider::Gemini);
        assert_eq!(Provider::for_model("ollama/llama3.2").unwrap(), Provider::Ollama);
    }

    #[test]
    fn test_unsupported_model() {
        for model in ["claude-3-haiku", "", "ollama/"] {
            let result = client_for_model(model, Some("key"), 0.2, RetryPolicy::default(), &Endpoints::default());
            assert!(matches!(result, Err(LongsumError::UnsupportedModel(_))), "model={:?}", model);
        }
    }

    #[test]
    fn test_hosted_provider_requires_key() {
        let result = client_for_model("gpt-3.5-turbo", None, 0.2, RetryPolicy::default(), &Endpoints::default());
        assert!(matches!(result, Err(LongsumError::Config(_))));
    }

    #[test]
    fn test_ollama_strips_prefix() {
        let client = client_for_model("ollama/llama3.2", None, 0.2, RetryPolicy::default(), &Endpoints::default())
            .unwrap();
        assert_eq!(client.model(), "llama3.2");
    }
}
