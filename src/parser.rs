use crate::types::{ArticleEntry, Result, SummarizerError};
use chrono::Utc;
use feed_rs::parser;
use std::collections::HashSet;
use tracing::{debug, info};

/// Parses RSS/Atom documents into [`ArticleEntry`] values, skipping
/// within-run duplicates by guid and link.
pub struct FeedParser {
    seen_guids: HashSet<String>,
    seen_links: HashSet<String>,
}

impl FeedParser {
    pub fn new() -> Self {
        Self {
            seen_guids: HashSet::new(),
            seen_links: HashSet::new(),
        }
    }

    pub fn parse_feed(&mut self, content: &str) -> Result<Vec<ArticleEntry>> {
        debug!(bytes = content.len(), "Parsing feed content");

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| SummarizerError::Parse(format!("failed to parse feed: {}", e)))?;

        let mut entries = Vec::new();
        for entry in feed.entries {
            if let Some(article) = self.parse_entry(entry) {
                entries.push(article);
            }
        }

        info!(count = entries.len(), "Parsed feed entries");
        Ok(entries)
    }

    fn parse_entry(&mut self, entry: feed_rs::model::Entry) -> Option<ArticleEntry> {
        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());

        let link = entry.links.first()?.href.clone();

        let guid = if entry.id.is_empty() {
            None
        } else {
            Some(entry.id.clone())
        };

        if let Some(ref guid) = guid {
            if self.seen_guids.contains(guid) {
                debug!(%guid, "Skipping duplicate entry by guid");
                return None;
            }
            self.seen_guids.insert(guid.clone());
        }

        if self.seen_links.contains(&link) {
            debug!(%link, "Skipping duplicate entry by link");
            return None;
        }
        self.seen_links.insert(link.clone());

        // Feed-carried text, preferring the explicit summary over the body.
        let raw_summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .filter(|text| !text.trim().is_empty());

        let published_at = entry.published.map(|dt| dt.with_timezone(&Utc));

        Some(ArticleEntry {
            title,
            link,
            guid,
            published_at,
            raw_summary,
        })
    }

    pub fn clear_dedup_cache(&mut self) {
        self.seen_guids.clear();
        self.seen_links.clear();
    }
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap pre-check that a fetched document might be an RSS/Atom feed, used
/// to avoid handing arbitrary HTML to the feed parser.
pub fn is_valid_feed_content(content: &str) -> bool {
    let content_lower = content.to_lowercase();

    let has_feed_indicators = content_lower.contains("<rss")
        || content_lower.contains("<feed")
        || content_lower.contains("xmlns=\"http://www.w3.org/2005/atom\"")
        || content_lower.contains("xmlns:atom")
        || content_lower.contains("<channel");

    let has_xml_declaration = content.trim_start().starts_with("<?xml");

    has_feed_indicators && (has_xml_declaration || content_lower.contains('<'))
}
