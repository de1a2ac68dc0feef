use crate::config::{write_feed_urls, AppConfig};
use crate::extractor::extract_excerpt;
use crate::fetcher::Fetcher;
use crate::parser::{is_valid_feed_content, FeedParser};
use crate::report::ReportBuilder;
use crate::store::ProcessedStore;
use crate::summarizer::Summarize;
use crate::types::{
    ArticleEntry, FeedSource, Result, RunStats, SummarizerError, SummaryResult,
    SUMMARY_EMPTY_CONTENT, SUMMARY_FAILED,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The run context: owns every component and threads them through one
/// sequential batch. No global state.
pub struct Pipeline {
    config: AppConfig,
    fetcher: Fetcher,
    parser: FeedParser,
    store: ProcessedStore,
    summarizer: Arc<dyn Summarize>,
    report: ReportBuilder,
    stats: RunStats,
}

impl Pipeline {
    pub fn new(config: AppConfig, summarizer: Arc<dyn Summarize>) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch.clone())?;
        let store = ProcessedStore::load(&config.processed_store)?;

        Ok(Self {
            config,
            fetcher,
            parser: FeedParser::new(),
            store,
            summarizer,
            report: ReportBuilder::new(),
            stats: RunStats::default(),
        })
    }

    pub fn report(&self) -> &ReportBuilder {
        &self.report
    }

    pub fn store(&self) -> &ProcessedStore {
        &self.store
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Persists links marked during this run. Exposed separately so tests
    /// can drive [`Pipeline::process_entries`] without a network.
    pub fn commit_store(&mut self) -> Result<usize> {
        self.store.commit()
    }

    /// Runs the whole batch: every configured feed, one article at a time.
    /// Per-feed and per-article failures degrade the run; only startup and
    /// output-artifact failures are fatal.
    pub async fn run(&mut self) -> Result<RunStats> {
        info!(summarizer = %self.summarizer.name(), "Starting run");
        self.summarizer.ensure_ready().await?;

        let sources = self.config.feed_sources()?;
        self.stats = RunStats::default();
        self.report = ReportBuilder::new();
        self.parser.clear_dedup_cache();

        for source in &sources {
            info!(url = %source.url, limit = source.max_articles, "Processing feed");
            match self.process_feed(source).await {
                Ok(0) => {
                    warn!(url = %source.url, "No new content from feed");
                    self.stats.feeds_ok += 1;
                    self.stats.invalid_feeds.push(source.url.clone());
                }
                Ok(count) => {
                    info!(url = %source.url, count, "Feed processed");
                    self.stats.feeds_ok += 1;
                }
                Err(e) => {
                    error!(url = %source.url, error = %e, "Feed failed, skipping");
                    self.stats.feeds_failed += 1;
                    self.stats.invalid_feeds.push(source.url.clone());
                }
            }
        }

        if self.report.is_empty() {
            info!("No summaries generated, skipping report");
        } else {
            self.report.write(&self.config.report_dir)?;
        }

        let appended = self.store.commit()?;
        debug!(appended, "Dedup store committed");

        if let Some(ref path) = self.config.invalid_feeds_file {
            if let Err(e) = write_feed_urls(path, &self.stats.invalid_feeds) {
                warn!(path = %path.display(), error = %e, "Failed to write invalid feeds file");
            }
        }

        if self.stats.feeds_failed == sources.len() {
            return Err(SummarizerError::General(format!(
                "all {} feeds failed",
                sources.len()
            )));
        }

        info!(
            feeds_ok = self.stats.feeds_ok,
            feeds_failed = self.stats.feeds_failed,
            processed = self.stats.articles_processed,
            skipped = self.stats.articles_skipped,
            failed = self.stats.summaries_failed,
            "Run complete"
        );
        Ok(self.stats.clone())
    }

    async fn process_feed(&mut self, source: &FeedSource) -> Result<usize> {
        let content = self.fetcher.fetch_feed(&source.url).await?;
        if !is_valid_feed_content(&content) {
            return Err(SummarizerError::Parse(
                "document does not look like an RSS/Atom feed".to_string(),
            ));
        }

        let entries = self.parser.parse_feed(&content)?;
        Ok(self
            .process_entries(&source.url, entries, source.max_articles)
            .await)
    }

    /// Considers up to `limit` entries, gates them through the dedup store,
    /// and summarizes the survivors. Returns how many report entries were
    /// produced for this feed.
    pub async fn process_entries(
        &mut self,
        feed_url: &str,
        entries: Vec<ArticleEntry>,
        limit: usize,
    ) -> usize {
        let mut produced = 0;

        for entry in entries.into_iter().take(limit) {
            if self.store.is_processed(&entry.link) {
                debug!(link = %entry.link, "Already processed, skipping");
                self.stats.articles_skipped += 1;
                continue;
            }

            debug!(feed = %feed_url, link = %entry.link, "Processing article");
            if self.process_entry(&entry).await {
                produced += 1;
            }
        }

        produced
    }

    /// Handles one new article end to end. Returns true when a report entry
    /// was produced (successful, failure-marked, or empty pass-through).
    async fn process_entry(&mut self, entry: &ArticleEntry) -> bool {
        let excerpt = match self.fetcher.fetch_page(&entry.link).await {
            Ok(html) => extract_excerpt(&html),
            Err(e) => {
                warn!(link = %entry.link, error = %e, "Page fetch failed, falling back to feed content");
                String::new()
            }
        };

        let excerpt = if excerpt.is_empty() {
            entry.raw_summary.clone().unwrap_or_default()
        } else {
            excerpt
        };

        if excerpt.trim().is_empty() {
            if self.config.allow_empty_excerpts {
                info!(link = %entry.link, "No content, passing through with placeholder");
                self.report.push(SummaryResult {
                    title: entry.title.clone(),
                    link: entry.link.clone(),
                    summary_text: SUMMARY_EMPTY_CONTENT.to_string(),
                });
                self.store.mark_processed(&entry.link);
                self.stats.articles_processed += 1;
                return true;
            }
            warn!(link = %entry.link, "No content, skipping article");
            self.stats.articles_skipped += 1;
            return false;
        }

        match self.summarizer.summarize(&excerpt).await {
            Ok(summary_text) => {
                self.report.push(SummaryResult {
                    title: entry.title.clone(),
                    link: entry.link.clone(),
                    summary_text,
                });
                self.store.mark_processed(&entry.link);
                self.stats.articles_processed += 1;
                true
            }
            Err(e) => {
                // Failure-marked entries go into the report but stay out of
                // the store so a later run can retry them.
                warn!(link = %entry.link, error = %e, "Summarization failed");
                self.report.push(SummaryResult {
                    title: entry.title.clone(),
                    link: entry.link.clone(),
                    summary_text: SUMMARY_FAILED.to_string(),
                });
                self.stats.summaries_failed += 1;
                true
            }
        }
    }
}
