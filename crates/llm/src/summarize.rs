use futures::future::join_all;
use longsum_common::{AppConfig, LongsumError, Result};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::chunking::RecursiveTextSplitter;
use crate::llm_trait::LlmClient;
use crate::prompts::PromptTemplates;
use crate::provider::{client_for_model, Endpoints};
use crate::retry::RetryPolicy;

/// Summarization strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Whole input in a single call
    Stuff,
    /// Summarize every chunk, then summarize the summaries
    MapReduce,
    /// Fold chunks one by one into a running summary
    Refine,
    /// No LLM calls, return the chunks joined by newlines
    SplitOnly,
}

impl From<&str> for Strategy {
    fn from(name: &str) -> Self {
        match name {
            "stuff" => Self::Stuff,
            "map_reduce" => Self::MapReduce,
            "refine" => Self::Refine,
            _ => Self::SplitOnly,
        }
    }
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stuff => "stuff",
            Self::MapReduce => "map_reduce",
            Self::Refine => "refine",
            Self::SplitOnly => "split_only",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives `(done, total)` after every completed call
pub trait ProgressSink: Send + Sync {
    fn report(&self, done: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, done: usize, total: usize) {
        self(done, total)
    }
}

/// Job counter scoped to one summarization call
struct ProgressCounter<'a> {
    done: AtomicUsize,
    total: usize,
    sink: Option<&'a dyn ProgressSink>,
}

impl<'a> ProgressCounter<'a> {
    fn new(total: usize, sink: Option<&'a dyn ProgressSink>) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
            sink,
        }
    }

    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Progress: {}/{}", done, self.total);
        if let Some(sink) = self.sink {
            sink.report(done, self.total);
        }
    }
}

/// Summarizer for long text
pub struct Summarizer {
    client: Arc<dyn LlmClient>,
    splitter: RecursiveTextSplitter,
    templates: PromptTemplates,
}

impl Summarizer {
    /// Create new summarizer with chunk size 1000 and overlap 100
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            splitter: RecursiveTextSplitter::new(1000, 100),
            templates: PromptTemplates::default(),
        }
    }

    pub fn with_splitter(mut self, splitter: RecursiveTextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Summarize text with the given strategy
    pub async fn summarize(
        &self,
        text: &str,
        strategy: Strategy,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<String> {
        info!(
            "Starting summarization - Strategy: {}, Model: {}, Text length: {} chars",
            strategy,
            self.client.model(),
            text.chars().count()
        );

        match strategy {
            Strategy::Stuff => self.stuff(text).await,
            Strategy::MapReduce => self.map_reduce(text, progress).await,
            Strategy::Refine => self.refine(text, progress).await,
            Strategy::SplitOnly => Ok(split_only(&self.splitter, text)),
        }
    }

    /// Single call over the whole input
    pub async fn stuff(&self, text: &str) -> Result<String> {
        self.client.complete(&self.templates.stuff_prompt(text)).await
    }

    /// Concurrent map over chunks followed by one reduce call
    pub async fn map_reduce(&self, text: &str, progress: Option<&dyn ProgressSink>) -> Result<String> {
        let chunks = self.split_for_chain(text)?;
        let total = chunks.len();
        let counter = ProgressCounter::new(total + 1, progress);

        // join_all keeps input order whatever order the calls finish in
        let map_outputs = join_all(chunks.iter().enumerate().map(|(i, chunk)| {
            let counter = &counter;
            async move {
                debug!("Summarizing chunk {}/{}", i + 1, total);
                let summary = self.client.complete(&self.templates.map_prompt(chunk)).await?;
                counter.tick();
                Ok::<String, LongsumError>(summary)
            }
        }))
        .await;

        let chunk_summaries = map_outputs.into_iter().collect::<Result<Vec<String>>>()?;

        let combined = chunk_summaries.join("\n\n");
        info!("Combined chunk summaries - Length: {} chars", combined.chars().count());

        let summary = self.client.complete(&self.templates.reduce_prompt(&combined)).await?;
        counter.tick();

        Ok(summary)
    }

    /// Sequential refinement of a running summary
    pub async fn refine(&self, text: &str, progress: Option<&dyn ProgressSink>) -> Result<String> {
        let chunks = self.split_for_chain(text)?;
        let counter = ProgressCounter::new(chunks.len(), progress);

        let mut summary = self.client.complete(&self.templates.stuff_prompt(&chunks[0])).await?;
        counter.tick();

        for (i, chunk) in chunks.iter().enumerate().skip(1) {
            debug!("Refining with chunk {}/{}", i + 1, chunks.len());
            summary = self
                .client
                .complete(&self.templates.refine_prompt(chunk, &summary))
                .await?;
            counter.tick();
        }

        Ok(summary)
    }

    /// Split for strategies that need at least two chunks
    fn split_for_chain(&self, text: &str) -> Result<Vec<String>> {
        let chunks = self.splitter.split_text(text);
        info!("Split text into {} chunks", chunks.len());

        match chunks.len() {
            0 => Err(LongsumError::invalid_input("input text is empty")),
            1 => Err(LongsumError::split_too_short(1)),
            _ => Ok(chunks),
        }
    }
}

fn split_only(splitter: &RecursiveTextSplitter, text: &str) -> String {
    let chunks = splitter.split_text(text);
    info!("Split text into {} chunks (no summarization)", chunks.len());
    chunks.join("\n")
}

/// Everything needed for one summarization run
#[derive(Clone)]
pub struct SummarizeRequest {
    pub text: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub strategy: Strategy,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_retries: u32,
    pub timeout: Duration,
    pub retry_backoff: Duration,
    pub templates: PromptTemplates,
    pub endpoints: Endpoints,
}

impl SummarizeRequest {
    /// Request for `text` using configured defaults
    pub fn from_config(text: impl Into<String>, config: &AppConfig) -> Self {
        Self {
            text: text.into(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            strategy: Strategy::from(config.strategy.as_str()),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            max_retries: config.max_retries,
            timeout: config.timeout(),
            retry_backoff: config.retry_backoff(),
            templates: PromptTemplates::with_overrides(
                config.stuff_prompt_template.clone(),
                config.map_prompt_template.clone(),
                config.reduce_prompt_template.clone(),
                config.refine_prompt_template.clone(),
            ),
            endpoints: Endpoints::from(config),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.timeout).with_backoff(self.retry_backoff)
    }

    pub fn splitter(&self) -> RecursiveTextSplitter {
        RecursiveTextSplitter::new(self.chunk_size, self.chunk_overlap)
    }
}

/// Summarize `request.text`, choosing the completion client from the model id
///
/// Split-only requests never touch a client, so they work for any model id.
pub async fn summarize(request: &SummarizeRequest, progress: Option<&dyn ProgressSink>) -> Result<String> {
    if request.strategy == Strategy::SplitOnly {
        return Ok(split_only(&request.splitter(), &request.text));
    }

    let client = client_for_model(
        &request.model,
        request.api_key.as_deref(),
        request.temperature,
        request.retry_policy(),
        &request.endpoints,
    )?;

    Summarizer::new(client)
        .with_splitter(request.splitter())
        .with_templates(request.templates.clone())
        .summarize(&request.text, request.strategy, progress)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with `<prompt>` and records every prompt it receives
    #[derive(Default)]
    struct EchoClient {
        prompts: Mutex<Vec<String>>,
        slow_on: Option<&'static str>,
        fail_on: Option<&'static str>,
    }

    impl EchoClient {
        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for EchoClient {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());

            if self.slow_on.is_some_and(|m| prompt.contains(m)) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            if self.fail_on.is_some_and(|m| prompt.contains(m)) {
                return Err(LongsumError::call_failed("scripted failure"));
            }

            Ok(format!("<{}>", prompt))
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    const TEXT: &str = "alpha beta gamma delta";

    fn templates() -> PromptTemplates {
        PromptTemplates {
            stuff: "STUFF:{__text__}".to_string(),
            map: "MAP:{__text__}".to_string(),
            reduce: "REDUCE:{__text__}".to_string(),
            refine: "REFINE:{__existing_answer__}|{__text__}".to_string(),
        }
    }

    fn summarizer(client: Arc<EchoClient>) -> Summarizer {
        // Splits TEXT into ["alpha beta", "gamma", "delta"]
        Summarizer::new(client)
            .with_splitter(RecursiveTextSplitter::new(10, 0))
            .with_templates(templates())
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(Strategy::from("stuff"), Strategy::Stuff);
        assert_eq!(Strategy::from("map_reduce"), Strategy::MapReduce);
        assert_eq!(Strategy::from("refine"), Strategy::Refine);
        assert_eq!(Strategy::from("preview"), Strategy::SplitOnly);
        assert_eq!(Strategy::MapReduce.to_string(), "map_reduce");
    }

    #[tokio::test]
    async fn test_stuff_single_call() {
        let client = Arc::new(EchoClient::default());
        let output = summarizer(client.clone())
            .summarize(TEXT, Strategy::Stuff, None)
            .await
            .unwrap();

        assert_eq!(output, format!("<STUFF:{}>", TEXT));
        assert_eq!(client.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_map_reduce_keeps_chunk_order() {
        // First chunk finishes last
        let client = Arc::new(EchoClient {
            slow_on: Some("alpha"),
            ..Default::default()
        });
        let reports = Mutex::new(Vec::new());
        let sink = |done: usize, total: usize| reports.lock().unwrap().push((done, total));

        let output = summarizer(client.clone())
            .summarize(TEXT, Strategy::MapReduce, Some(&sink))
            .await
            .unwrap();

        let reduce_prompt = "REDUCE:<MAP:alpha beta>\n\n<MAP:gamma>\n\n<MAP:delta>";
        assert_eq!(output, format!("<{}>", reduce_prompt));

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 4);
        assert_eq!(prompts.last().unwrap(), reduce_prompt);

        let reports = reports.into_inner().unwrap();
        assert_eq!(reports, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[tokio::test]
    async fn test_map_reduce_single_chunk_is_too_short() {
        let client = Arc::new(EchoClient::default());
        let result = summarizer(client.clone())
            .summarize("tiny", Strategy::MapReduce, None)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, LongsumError::SplitTooShort { chunks: 1 }));
        assert!(err.suggests_other_strategy());
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_refine_single_chunk_is_too_short() {
        let client = Arc::new(EchoClient::default());
        let result = summarizer(client.clone())
            .summarize("tiny", Strategy::Refine, None)
            .await;

        assert!(matches!(result, Err(LongsumError::SplitTooShort { chunks: 1 })));
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_map_reduce_failure_skips_reduce() {
        let client = Arc::new(EchoClient {
            fail_on: Some("gamma"),
            ..Default::default()
        });
        let result = summarizer(client.clone())
            .summarize(TEXT, Strategy::MapReduce, None)
            .await;

        assert!(matches!(result, Err(LongsumError::CallFailed(_))));

        // Every map call still ran, the reduce call never did
        let prompts = client.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts.iter().all(|p| p.starts_with("MAP:")));
    }

    #[tokio::test]
    async fn test_refine_threads_running_summary() {
        let client = Arc::new(EchoClient::default());
        let reports = Mutex::new(Vec::new());
        let sink = |done: usize, total: usize| reports.lock().unwrap().push((done, total));

        let output = summarizer(client.clone())
            .summarize(TEXT, Strategy::Refine, Some(&sink))
            .await
            .unwrap();

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[0], "STUFF:alpha beta");
        assert_eq!(prompts[1], "REFINE:<STUFF:alpha beta>|gamma");
        assert_eq!(prompts[2], format!("REFINE:<{}>|delta", prompts[1]));
        assert_eq!(output, format!("<{}>", prompts[2]));

        assert_eq!(reports.into_inner().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_refine_stops_at_first_failure() {
        let client = Arc::new(EchoClient {
            fail_on: Some("gamma"),
            ..Default::default()
        });
        let result = summarizer(client.clone())
            .summarize(TEXT, Strategy::Refine, None)
            .await;

        assert!(matches!(result, Err(LongsumError::CallFailed(_))));
        assert_eq!(client.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_split_only_makes_no_calls() {
        let client = Arc::new(EchoClient::default());
        let output = summarizer(client.clone())
            .summarize(TEXT, Strategy::SplitOnly, None)
            .await
            .unwrap();

        assert_eq!(output, "alpha beta\ngamma\ndelta");
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_rejected_by_chained_strategies() {
        let client = Arc::new(EchoClient::default());
        let summarizer = summarizer(client);
        for strategy in [Strategy::MapReduce, Strategy::Refine] {
            let result = summarizer.summarize("", strategy, None).await;
            assert!(matches!(result, Err(LongsumError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn test_request_with_unknown_model() {
        let mut request = SummarizeRequest::from_config(TEXT, &AppConfig::default());
        request.model = "claude-3-haiku".to_string();
        request.strategy = Strategy::MapReduce;

        let result = summarize(&request, None).await;
        assert!(matches!(result, Err(LongsumError::UnsupportedModel(_))));

        request.strategy = Strategy::SplitOnly;
        request.chunk_size = 10;
        request.chunk_overlap = 0;
        assert_eq!(summarize(&request, None).await.unwrap(), "alpha beta\ngamma\ndelta");
    }

    #[test]
    fn test_request_from_config() {
        let mut config = AppConfig::default();
        config.strategy = "refine".to_string();
        config.retry_backoff_ms = 250;
        config.map_prompt_template = Some("M {__text__}".to_string());

        let request = SummarizeRequest::from_config("text", &config);
        assert_eq!(request.strategy, Strategy::Refine);
        assert_eq!(request.templates.map, "M {__text__}");
        assert_eq!(request.retry_policy().backoff, Duration::from_millis(250));
        assert_eq!(request.splitter().chunk_overlap, 100);
    }
}
