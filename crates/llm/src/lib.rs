//! Longsum LLM Integration
//!
//! Recursive text splitting, chat completion clients and long-text
//! summarization strategies (stuff, map-reduce, refine)

mod chunking;
mod client;
mod counting;
mod gemini_client;
mod llm_trait;
mod openai_client;
mod prompts;
mod provider;
mod retry;
mod summarize;
mod types;

pub use chunking::{merge_splits, split_text, RecursiveTextSplitter, DEFAULT_SEPARATORS};
pub use client::OllamaClient;
pub use counting::{approximate_tokens, count_characters, count_words, TextStats};
pub use gemini_client::GeminiClient;
pub use llm_trait::LlmClient;
pub use openai_client::OpenAiClient;
pub use prompts::{substitute, PromptTemplates, REFINE_PROMPT, STUFF_PROMPT};
pub use provider::{client_for_model, Endpoints, Provider, OLLAMA_PREFIX};
pub use retry::{with_retry, RetryPolicy};
pub use summarize::{summarize, ProgressSink, Strategy, SummarizeRequest, Summarizer};
pub use types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, GeminiRequest, GeminiResponse,
    GenerateOptions, GenerateRequest, GenerateResponse, Role,
};
