use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured feed: where to fetch and how many entries to consider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub url: String,
    pub max_articles: usize,
}

impl FeedSource {
    pub fn new(url: impl Into<String>, max_articles: usize) -> Self {
        Self {
            url: url.into(),
            max_articles,
        }
    }
}

/// One article's metadata as parsed from a feed. Transient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleEntry {
    pub title: String,
    pub link: String,
    pub guid: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Summary or content body carried by the feed itself, used as a
    /// fallback when page extraction yields nothing.
    pub raw_summary: Option<String>,
}

/// Produced after the model call; collected into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    pub title: String,
    pub link: String,
    pub summary_text: String,
}

impl SummaryResult {
    pub fn is_failed(&self) -> bool {
        self.summary_text == SUMMARY_FAILED
    }
}

/// Marker stored as `summary_text` when the inference call fails.
pub const SUMMARY_FAILED: &str = "Summary generation failed.";

/// Placeholder stored as `summary_text` for pass-through entries whose
/// extraction produced no text.
pub const SUMMARY_EMPTY_CONTENT: &str = "No article content available.";

/// HTTP behavior shared by feed and page fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "rss-summarizer/0.1".to_string(),
            timeout_seconds: 30,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

/// Counters reported by a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub feeds_ok: usize,
    pub feeds_failed: usize,
    pub articles_processed: usize,
    pub articles_skipped: usize,
    pub summaries_failed: usize,
    pub invalid_feeds: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, SummarizerError>;
