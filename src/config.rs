use crate::types::{FeedSource, FetchConfig, Result, SummarizerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Model endpoint settings for the local inference server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the inference server, e.g. `http://127.0.0.1:11434`.
    pub endpoint: String,
    pub model: String,
    /// Overrides the built-in summarization prompt when set.
    #[serde(default)]
    pub prompt: Option<String>,
}

/// An inline feed declaration. `max_articles` falls back to the global
/// `articles_per_feed` when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedDecl {
    pub url: String,
    #[serde(default)]
    pub max_articles: Option<usize>,
}

fn default_articles_per_feed() -> usize {
    5
}

fn default_store_path() -> PathBuf {
    PathBuf::from("processed_articles.json")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("feedreader.log")
}

/// Settings file contents. Everything the run needs is loaded once here and
/// threaded through the pipeline explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feeds: Vec<FeedDecl>,

    /// Optional plain-text feed list, one URL per line, `#` comments.
    #[serde(default)]
    pub feeds_file: Option<PathBuf>,

    #[serde(default = "default_articles_per_feed")]
    pub articles_per_feed: usize,

    pub model: ModelConfig,

    #[serde(default = "default_store_path")]
    pub processed_store: PathBuf,

    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Feeds that failed or yielded nothing are written here after the run.
    #[serde(default)]
    pub invalid_feeds_file: Option<PathBuf>,

    /// When true, entries whose extraction and feed fallback both come up
    /// empty still appear in the report with a placeholder summary.
    #[serde(default)]
    pub allow_empty_excerpts: bool,

    #[serde(default)]
    pub fetch: FetchConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            SummarizerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = serde_json::from_str(&raw).map_err(|e| {
            SummarizerError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Resolves the effective feed list: inline declarations first, then the
    /// optional feeds file, each line getting the global per-feed limit.
    pub fn feed_sources(&self) -> Result<Vec<FeedSource>> {
        let mut sources: Vec<FeedSource> = self
            .feeds
            .iter()
            .map(|decl| {
                FeedSource::new(
                    decl.url.clone(),
                    decl.max_articles.unwrap_or(self.articles_per_feed),
                )
            })
            .collect();

        if let Some(ref path) = self.feeds_file {
            for url in read_feed_urls(path)? {
                if !sources.iter().any(|s| s.url == url) {
                    sources.push(FeedSource::new(url, self.articles_per_feed));
                }
            }
        }

        if sources.is_empty() {
            return Err(SummarizerError::Config(
                "no feeds configured (set `feeds` or `feeds_file`)".to_string(),
            ));
        }

        info!(count = sources.len(), "Resolved feed sources");
        Ok(sources)
    }
}

/// Reads a plain-text feed list: one URL per line, blank lines and lines
/// starting with `#` ignored.
pub fn read_feed_urls(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path).map_err(|e| {
        SummarizerError::Config(format!("cannot read feeds file {}: {}", path.display(), e))
    })?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Writes the invalid-feeds list, one URL per line.
pub fn write_feed_urls(path: &Path, urls: &[String]) -> Result<()> {
    let mut out = String::new();
    for url in urls {
        out.push_str(url);
        out.push('\n');
    }
    fs::write(path, out)?;
    Ok(())
}
