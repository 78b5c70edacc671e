mod progress;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use longsum_common::{logger, AppConfig};
use longsum_llm::{ProgressSink, RecursiveTextSplitter, Strategy, SummarizeRequest, TextStats};
use std::io::Read;
use std::path::PathBuf;

use crate::progress::CallProgress;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        // Fallback to default dotenv behavior
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "longsum")]
#[command(about = "Longsum - summarize arbitrarily long text with chat completion models", long_about = None)]
struct Cli {
    /// Log level (overrides LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Input file, stdin when absent or "-"
    file: Option<PathBuf>,
}

#[derive(Args)]
struct ChunkArgs {
    /// Maximum chunk length in characters
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared by neighbouring chunks
    #[arg(long)]
    chunk_overlap: Option<usize>,
}

#[derive(Args)]
struct ModelArgs {
    /// Model identifier (gpt-*, gemini-*, ollama/<name>)
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// stuff, map_reduce, refine (anything else only splits)
    #[arg(long)]
    strategy: Option<String>,

    /// Attempts per completion call
    #[arg(long)]
    max_retries: Option<u32>,

    /// Per-attempt timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// API key for the selected provider
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a text
    Summarize {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        chunking: ChunkArgs,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Preview how a text is split into chunks
    Split {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        chunking: ChunkArgs,
    },

    /// Count characters, words and tokens
    Count {
        #[command(flatten)]
        input: InputArgs,
    },
}

impl ChunkArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(chunk_overlap) = self.chunk_overlap {
            config.chunk_overlap = chunk_overlap;
        }
    }
}

impl ModelArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(strategy) = &self.strategy {
            config.strategy = strategy.clone();
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
    }
}

impl InputArgs {
    fn read(&self) -> Result<String> {
        match &self.file {
            Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display())),
            _ => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read stdin")?;
                Ok(text)
            }
        }
    }
}

fn setup_logging(config: &AppConfig) -> Result<()> {
    logger::setup_logging(config.log_dir.as_deref(), &config.log_level)?;
    Ok(())
}

/// Progress bar for strategies that make more than one call
fn progress_for(strategy: Strategy) -> Result<Option<CallProgress>> {
    match strategy {
        Strategy::MapReduce | Strategy::Refine => Ok(Some(CallProgress::new()?)),
        Strategy::Stuff | Strategy::SplitOnly => Ok(None),
    }
}

async fn run_summarize(config: &AppConfig, text: String) -> Result<()> {
    let request = SummarizeRequest::from_config(text, config);

    tracing::info!("Configuration loaded:");
    tracing::info!("  Model: {}", request.model);
    tracing::info!("  Temperature: {}", request.temperature);
    tracing::info!("  Strategy: {}", request.strategy);
    tracing::info!("  Chunk size: {}", request.chunk_size);
    tracing::info!("  Chunk overlap: {}", request.chunk_overlap);
    tracing::info!("  Timeout: {:?}", request.timeout);

    let progress = progress_for(request.strategy)?;
    let sink = progress.as_ref().map(|p| p as &dyn ProgressSink);

    match longsum_llm::summarize(&request, sink).await {
        Ok(summary) => {
            if let Some(progress) = &progress {
                progress.finish();
            }
            println!("{}", summary);
            Ok(())
        }
        Err(e) => {
            if let Some(progress) = &progress {
                progress.abandon();
            }
            if e.suggests_other_strategy() {
                eprintln!("hint: the input fits in a single chunk, try --strategy stuff");
            }
            Err(e.into())
        }
    }
}

fn run_split(config: &AppConfig, text: &str) {
    let chunks = RecursiveTextSplitter::new(config.chunk_size, config.chunk_overlap).split_text(text);

    for (i, chunk) in chunks.iter().enumerate() {
        println!("--- chunk {}/{} ({} chars) ---", i + 1, chunks.len(), chunk.chars().count());
        println!("{}", chunk);
    }
}

fn run_count(text: &str) {
    let stats = TextStats::of(text);
    println!("Characters: {}", stats.characters);
    println!("Words: {}", stats.words);
    println!("Tokens: {}", stats.tokens);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env at project root
    load_dotenv_from_project_root();

    let mut config = AppConfig::from_env()?;
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    match cli.command {
        Commands::Summarize { input, chunking, model } => {
            chunking.apply(&mut config);
            model.apply(&mut config);
            setup_logging(&config)?;
            config.validate()?;

            let text = input.read()?;
            run_summarize(&config, text).await?;
        }
        Commands::Split { input, chunking } => {
            chunking.apply(&mut config);
            setup_logging(&config)?;
            config.validate()?;

            run_split(&config, &input.read()?);
        }
        Commands::Count { input } => {
            setup_logging(&config)?;
            run_count(&input.read()?);
        }
    }

    Ok(())
}
