use async_trait::async_trait;
use longsum_common::{LongsumError, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::llm_trait::LlmClient;
use crate::retry::{with_retry, RetryPolicy};
use crate::types::{GenerateOptions, GenerateRequest, GenerateResponse};

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
    model: String,
    temperature: f32,
    policy: RetryPolicy,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        info!("Ollama client initialized: {}", base_url);
        Ok(Self {
            base_url,
            client,
            model: model.into(),
            temperature,
            policy,
        })
    }

    fn build_request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: Some(false),
            options: Some(GenerateOptions {
                temperature: Some(self.temperature),
            }),
        }
    }

    /// Single attempt to generate text
    async fn try_generate(&self, url: &str, request: &GenerateRequest) -> Result<String> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| LongsumError::network(format!("Failed to send request: {}", e)))?
            .error_for_status()
            .map_err(|e| LongsumError::network(format!("Ollama API error: {}", e)))?;

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LongsumError::serialization(format!("Failed to parse response: {}", e)))?;

        if result.response.is_empty() {
            return Err(anyhow::anyhow!("Empty response from Ollama").into());
        }

        Ok(result.response)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = self.build_request(prompt);

        debug!(
            "Sending generate request to Ollama - Model: {}, Prompt length: {}",
            request.model,
            request.prompt.len()
        );

        with_retry(&self.policy, "Ollama", || self.try_generate(&url, &request)).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new(
            "http://localhost:11434/",
            "llama3.2",
            0.2,
            RetryPolicy::default(),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.model(), "llama3.2");
    }

    #[test]
    fn test_build_request_is_not_streaming() {
        let client =
            OllamaClient::new("http://localhost:11434", "llama3.2", 0.7, RetryPolicy::default())
                .unwrap();
        let request = client.build_request("hello");
        assert_eq!(request.stream, Some(false));
        assert_eq!(request.options.unwrap().temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_call_failed() {
        // Reserve a free port, then release it so nothing is listening there
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let policy = RetryPolicy::new(2, Duration::from_millis(500));
        let base_url = format!("http://127.0.0.1:{}", port);
        let client = OllamaClient::new(&base_url, "llama3.2", 0.2, policy).unwrap();
        let result = client.complete("hello").await;
        assert!(matches!(result, Err(LongsumError::CallFailed(_))));
    }
}
