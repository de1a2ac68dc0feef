use anyhow::Context;
use clap::Parser;
use rss_summarizer::summarizer::OllamaSummarizer;
use rss_summarizer::{AppConfig, Pipeline};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[derive(Parser, Debug)]
#[command(
    name = "rss-summarizer",
    version,
    about = "Summarize new RSS feed articles with a local inference server"
)]
struct Cli {
    /// Path to the JSON settings file
    #[arg(short, long, default_value = "settings.json")]
    config: PathBuf,
}

/// Logs go to stdout and to the configured append-only log file.
fn init_tracing(log_file: &Path) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("cannot open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    init_tracing(&config.log_file)?;
    info!(config = %args.config.display(), "rss-summarizer starting");

    let summarizer = Arc::new(OllamaSummarizer::new(&config.model)?);
    let mut pipeline = Pipeline::new(config, summarizer)?;

    let stats = pipeline.run().await.context("batch run failed")?;
    info!(
        feeds_ok = stats.feeds_ok,
        feeds_failed = stats.feeds_failed,
        articles = stats.articles_processed,
        "Done"
    );

    Ok(())
}
