use async_trait::async_trait;
use longsum_common::{LongsumError, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::llm_trait::LlmClient;
use crate::retry::{with_retry, RetryPolicy};
use crate::types::{GeminiContent, GeminiGenerationConfig, GeminiPart, GeminiRequest, GeminiResponse};

/// Gemini generateContent client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: Client,
    model: String,
    temperature: f32,
    policy: RetryPolicy,
}

impl GeminiClient {
    /// Create new Gemini client
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

        info!("Gemini client initialized: {}", base_url);
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            client,
            model: model.into(),
            temperature,
            policy,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
            },
        }
    }

    /// Single attempt
    async fn try_generate(&self, url: &str, request: &GeminiRequest) -> Result<String> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| LongsumError::network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LongsumError::network(format!("Gemini API error: {} {}", status, body)));
        }

        let result: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LongsumError::serialization(format!("Failed to parse response: {}", e)))?;

        match result.into_text() {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(anyhow::anyhow!("Missing candidates[0].content.parts[0].text in Gemini response").into()),
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        let request = self.build_request(prompt);

        debug!(
            "Sending generateContent request - Model: {}, Prompt length: {}",
            self.model,
            prompt.len()
        );

        with_retry(&self.policy, "Gemini", || self.try_generate(&url, &request)).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
