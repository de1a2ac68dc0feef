use crate::types::{FetchConfig, Result, SummarizerError};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

/// Minimum spacing between requests to the same host.
const MIN_HOST_INTERVAL: Duration = Duration::from_secs(1);

/// HTTP front-end for both feed XML and article pages. One attempt per
/// operation; callers decide whether a failure skips the feed or the article.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    rate_limiter: Arc<RwLock<HashMap<String, Instant>>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Fetches a feed document and returns its body as text.
    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        debug!(%url, "Fetching feed");
        self.apply_rate_limit(url).await?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SummarizerError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        if let Some(content_length) = response.content_length() {
            let size_mb = content_length as usize / (1024 * 1024);
            if size_mb > self.config.max_feed_size_mb {
                return Err(SummarizerError::FeedTooLarge { size_mb });
            }
        }

        let content = response.text().await?;
        info!(%url, bytes = content.len(), "Fetched feed");
        Ok(content)
    }

    /// Fetches an article page. Sends browser-like headers since many sites
    /// serve reduced markup to unknown agents.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!(%url, "Fetching article page");
        self.apply_rate_limit(url).await?;

        let response = self
            .client
            .get(url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Referer", "https://www.google.com/")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizerError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let content = response.text().await?;
        debug!(%url, bytes = content.len(), "Fetched article page");
        Ok(content)
    }

    async fn apply_rate_limit(&self, url: &str) -> Result<()> {
        let parsed_url = Url::parse(url)?;
        let host = parsed_url.host_str().unwrap_or("").to_string();

        let now = Instant::now();
        let mut rate_limiter = self.rate_limiter.write().await;

        if let Some(last_request) = rate_limiter.get(&host) {
            let elapsed = now.duration_since(*last_request);
            if elapsed < MIN_HOST_INTERVAL {
                let wait_time = MIN_HOST_INTERVAL - elapsed;
                debug!(%host, ?wait_time, "Rate limiting");
                tokio::time::sleep(wait_time).await;
            }
        }

        rate_limiter.insert(host, Instant::now());
        Ok(())
    }
}
