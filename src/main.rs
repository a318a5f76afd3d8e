use anyhow::Context;
use clap::{Parser, Subcommand};
use dish_annotator::{
    classification_task, load_records, run_pass, segmentation_task, AnnotateConfig,
    OllamaBackend, Pass,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "dish-annotator", about = "Two-stage LLM annotation of dish names")]
struct Cli {
    /// Model identifier passed to the backend
    #[arg(long, default_value = "deepseek-r1:32b")]
    model: String,

    /// Base URL of the Ollama-compatible backend
    #[arg(long, default_value = "http://localhost:11434")]
    base_url: String,

    /// Records per chunk; requests within a chunk run concurrently
    #[arg(long, default_value_t = 200)]
    batch_size: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Segment dish names into semantic tokens
    Segment {
        #[arg(long, default_value = "data/dishes/dishes.csv")]
        input: PathBuf,
        #[arg(long, default_value = "data/dishes/tokenized.csv")]
        output: PathBuf,
    },
    /// Classify segmented tokens into the seven categories
    Label {
        #[arg(long, default_value = "data/dishes/tokenized.csv")]
        input: PathBuf,
        #[arg(long, default_value = "data/dishes/labeled.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AnnotateConfig {
        model: cli.model,
        batch_size: cli.batch_size,
        base_url: cli.base_url,
        timeout_seconds: cli.timeout,
    };

    let backend = OllamaBackend::new(&config).context("failed to build backend client")?;

    let (task, pass, input, output) = match cli.command {
        Command::Segment { input, output } => {
            (segmentation_task()?, Pass::Segmentation, input, output)
        }
        Command::Label { input, output } => {
            (classification_task()?, Pass::Classification, input, output)
        }
    };

    let mut records = load_records(&input)
        .with_context(|| format!("failed to load records from {}", input.display()))?;

    let outcome = run_pass(
        &mut records,
        &task,
        pass,
        &backend,
        config.batch_size,
        &output,
    )
    .await?;

    info!(
        "Pass complete: {} records annotated in {} chunk(s), written to {}",
        outcome.records_annotated,
        outcome.chunks_completed,
        output.display()
    );
    Ok(())
}
