use async_trait::async_trait;
use longsum_common::Result;

/// Common trait for chat completion clients
///
/// A client is bound to its credential, model, temperature and retry policy
/// when it is built. `complete` owns the retry/timeout loop and fails with
/// `LongsumError::CallFailed` once every attempt has failed.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the prompt as a single user message and return the reply text
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier the client talks to
    fn model(&self) -> &str;
}
