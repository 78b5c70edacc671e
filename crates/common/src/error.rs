/// Longsum error types
#[derive(Debug, thiserror::Error)]
pub enum LongsumError {
    /// The selected strategy needs at least two chunks
    #[error("Input is too short to be split (produced {chunks} chunk)")]
    SplitTooShort { chunks: usize },

    /// The chat completion capability gave up on a call
    #[error("API call failed: {0}")]
    CallFailed(String),

    /// No completion client is known for the model identifier
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LongsumError {
    /// Create split-too-short error
    pub fn split_too_short(chunks: usize) -> Self {
        Self::SplitTooShort { chunks }
    }

    /// Create call failed error
    pub fn call_failed<S: Into<String>>(msg: S) -> Self {
        Self::CallFailed(msg.into())
    }

    /// Create unsupported model error
    pub fn unsupported_model<S: Into<String>>(model: S) -> Self {
        Self::UnsupportedModel(model.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create serialization error
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the caller should retry with a strategy that does not chunk
    pub fn suggests_other_strategy(&self) -> bool {
        matches!(self, Self::SplitTooShort { .. })
    }
}
