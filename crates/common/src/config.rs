use crate::error::LongsumError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Longsum application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credential passed through to the completion endpoint
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Model identifier (e.g., "gpt-3.5-turbo", "gemini-pro", "ollama/llama3.2")
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Summarization strategy name (stuff, map_reduce, refine, anything else = split only)
    pub strategy: String,

    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,

    /// Attempts per completion call
    pub max_retries: u32,

    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,

    /// Base delay between attempts in milliseconds (doubles every attempt)
    pub retry_backoff_ms: u64,

    /// OpenAI-compatible API base URL
    pub openai_base_url: String,

    /// Gemini API base URL
    pub gemini_base_url: String,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Prompt template overrides
    pub stuff_prompt_template: Option<String>,
    pub map_prompt_template: Option<String>,
    pub reduce_prompt_template: Option<String>,
    pub refine_prompt_template: Option<String>,

    /// Log directory (console only when absent)
    pub log_dir: Option<PathBuf>,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
            strategy: "map_reduce".to_string(),
            chunk_size: 1000,
            chunk_overlap: 100,
            max_retries: 3,
            timeout_ms: 6000,
            retry_backoff_ms: 0,
            openai_base_url: "https://api.openai.com".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            stuff_prompt_template: None,
            map_prompt_template: None,
            reduce_prompt_template: None,
            refine_prompt_template: None,
            log_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, LongsumError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();

        let config = Self {
            api_key: Self::get_env("LONGSUM_API_KEY"),
            model: Self::get_env("LONGSUM_MODEL").unwrap_or(defaults.model),
            temperature: Self::get_env_parsed("LONGSUM_TEMPERATURE")
                .unwrap_or(defaults.temperature),
            strategy: Self::get_env("LONGSUM_STRATEGY").unwrap_or(defaults.strategy),
            chunk_size: Self::get_env_parsed("LONGSUM_CHUNK_SIZE")
                .unwrap_or(defaults.chunk_size),
            chunk_overlap: Self::get_env_parsed("LONGSUM_CHUNK_OVERLAP")
                .unwrap_or(defaults.chunk_overlap),
            max_retries: Self::get_env_parsed("LONGSUM_MAX_RETRIES")
                .unwrap_or(defaults.max_retries),
            timeout_ms: Self::get_env_parsed("LONGSUM_TIMEOUT_MS")
                .unwrap_or(defaults.timeout_ms),
            retry_backoff_ms: Self::get_env_parsed("LONGSUM_RETRY_BACKOFF_MS")
                .unwrap_or(defaults.retry_backoff_ms),
            openai_base_url: Self::get_env("OPENAI_BASE_URL")
                .unwrap_or(defaults.openai_base_url),
            gemini_base_url: Self::get_env("GEMINI_BASE_URL")
                .unwrap_or(defaults.gemini_base_url),
            ollama_base_url: Self::get_env("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            stuff_prompt_template: Self::get_env("STUFF_PROMPT_TEMPLATE"),
            map_prompt_template: Self::get_env("MAP_PROMPT_TEMPLATE"),
            reduce_prompt_template: Self::get_env("REDUCE_PROMPT_TEMPLATE"),
            refine_prompt_template: Self::get_env("REFINE_PROMPT_TEMPLATE"),
            log_dir: Self::get_env("LOG_DIR").map(PathBuf::from),
            log_level: Self::get_env("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        Ok(config)
    }

    /// Get non-empty string from environment variable
    fn get_env(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Get parsed value from environment variable, ignoring values that do not parse
    fn get_env_parsed<T: FromStr>(key: &str) -> Option<T> {
        Self::get_env(key).and_then(|s| s.trim().parse().ok())
    }

    /// Per-attempt timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base delay between attempts
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), LongsumError> {
        if self.model.is_empty() {
            return Err(LongsumError::config("Model name cannot be empty"));
        }

        if self.chunk_size == 0 {
            return Err(LongsumError::config("Chunk size must be greater than 0"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LongsumError::config(format!(
                "Temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        if self.timeout_ms == 0 {
            return Err(LongsumError::config("Timeout cannot be 0"));
        }

        for (name, url) in [
            ("OpenAI", &self.openai_base_url),
            ("Gemini", &self.gemini_base_url),
            ("Ollama", &self.ollama_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(LongsumError::config(format!(
                    "{} base URL must start with http:// or https://",
                    name
                )));
            }
        }

        // Accepted, but the overlap eviction can no longer shrink chunks
        if self.chunk_overlap >= self.chunk_size {
            tracing::warn!(
                "Chunk overlap ({}) is not smaller than chunk size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }

        Ok(())
    }
}
