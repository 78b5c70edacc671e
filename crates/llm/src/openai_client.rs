use async_trait::async_trait;
use longsum_common::{LongsumError, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::llm_trait::LlmClient;
use crate::retry::{with_retry, RetryPolicy};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

/// OpenAI-compatible chat completion client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: Client,
    model: String,
    temperature: f32,
    policy: RetryPolicy,
}

impl OpenAiClient {
    /// Create new OpenAI client
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        info!("OpenAI client initialized: {}", base_url);
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client,
            model: model.into(),
            temperature,
            policy,
        })
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![ChatMessage::user(prompt)],
        }
    }

    /// Single attempt
    async fn try_complete(&self, url: &str, request: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| LongsumError::network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LongsumError::network(format!("OpenAI API error: {} {}", status, body)));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LongsumError::serialization(format!("Failed to parse response: {}", e)))?;

        match result.into_content() {
            Some(content) if !content.is_empty() => Ok(content),
            _ => Err(anyhow::anyhow!("Missing choices[0].message.content in OpenAI response").into()),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = self.build_request(prompt);

        debug!(
            "Sending chat completion request - Model: {}, Prompt length: {}",
            request.model,
            prompt.len()
        );

        with_retry(&self.policy, "OpenAI", || self.try_complete(&url, &request)).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        let client = OpenAiClient::new(
            "https://api.openai.com/",
            "sk-test",
            "gpt-3.5-turbo",
            0.2,
            RetryPolicy::default(),
        )
        .unwrap();
        let request = client.build_request("Write a summary");

        assert_eq!(client.base_url, "https://api.openai.com");
        assert_eq!(request.model, "gpt-3.5-turbo");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "Write a summary");
    }
}
