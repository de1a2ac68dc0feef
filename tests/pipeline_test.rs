use rss_summarizer::config::{AppConfig, FeedDecl, ModelConfig};
use rss_summarizer::parser::is_valid_feed_content;
use rss_summarizer::{
    ArticleEntry, FeedParser, FetchConfig, MockSummarizer, Pipeline, ProcessedStore,
    ReportBuilder, SummaryResult, SUMMARY_EMPTY_CONTENT, SUMMARY_FAILED,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn test_config(dir: &Path, allow_empty_excerpts: bool) -> AppConfig {
    AppConfig {
        feeds: vec![FeedDecl {
            url: "http://127.0.0.1:1/feed.xml".to_string(),
            max_articles: None,
        }],
        feeds_file: None,
        articles_per_feed: 5,
        model: ModelConfig {
            endpoint: "http://127.0.0.1:11434".to_string(),
            model: "test-model".to_string(),
            prompt: None,
        },
        processed_store: dir.join("processed.json"),
        report_dir: dir.join("reports"),
        log_file: dir.join("run.log"),
        invalid_feeds_file: None,
        allow_empty_excerpts,
        fetch: FetchConfig {
            timeout_seconds: 2,
            ..FetchConfig::default()
        },
    }
}

/// Links use unroutable loopback ports and distinct hosts so page fetches
/// fail fast and the pipeline falls back to feed-carried content.
fn entry(n: usize, raw_summary: Option<&str>) -> ArticleEntry {
    ArticleEntry {
        title: format!("Article {}", n),
        link: format!("http://127.0.0.{}:1/article-{}", n + 1, n),
        guid: None,
        published_at: None,
        raw_summary: raw_summary.map(str::to_string),
    }
}

fn sample_feed_xml(count: usize) -> String {
    let mut items = String::new();
    for n in 0..count {
        items.push_str(&format!(
            "<item><title>Article {n}</title>\
             <link>http://127.0.0.{host}:1/article-{n}</link>\
             <guid>http://127.0.0.{host}:1/article-{n}</guid>\
             <description>Body text for article {n}. More detail follows here.</description>\
             </item>",
            n = n,
            host = n + 1,
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <rss version=\"2.0\"><channel><title>Test Feed</title>{}</channel></rss>",
        items
    )
}

#[test]
fn feed_content_validation() {
    assert!(is_valid_feed_content(&sample_feed_xml(1)));
    assert!(!is_valid_feed_content(
        "<html><body>not a feed</body></html>"
    ));
}

#[test]
fn parser_yields_all_entries_and_skips_duplicates() {
    let mut parser = FeedParser::new();
    let entries = parser.parse_feed(&sample_feed_xml(7)).unwrap();
    assert_eq!(entries.len(), 7);
    assert_eq!(entries[0].title, "Article 0");
    assert!(entries[0].raw_summary.is_some());

    // Same document again: every guid/link is a within-run duplicate.
    let again = parser.parse_feed(&sample_feed_xml(7)).unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn limit_bounds_entries_considered() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let mut pipeline = Pipeline::new(config, Arc::new(MockSummarizer::new("limit"))).unwrap();

    let mut parser = FeedParser::new();
    let entries = parser.parse_feed(&sample_feed_xml(7)).unwrap();

    let produced = pipeline
        .process_entries("http://feed.example/rss", entries, 3)
        .await;

    assert_eq!(produced, 3);
    assert_eq!(pipeline.stats().articles_processed, 3);
    assert_eq!(pipeline.stats().articles_skipped, 0);
}

#[tokio::test]
async fn new_entries_are_processed_and_known_ones_skipped() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path(), false);

    // Two of the five links were summarized by a previous run.
    fs::write(
        &config.processed_store,
        r#"["http://127.0.0.1:1/article-0", "http://127.0.0.2:1/article-1"]"#,
    )
    .unwrap();

    let mut pipeline = Pipeline::new(config.clone(), Arc::new(MockSummarizer::new("dedup"))).unwrap();
    let entries: Vec<ArticleEntry> = (0..5)
        .map(|n| entry(n, Some("Feed body sentence one. Feed body sentence two.")))
        .collect();

    let produced = pipeline
        .process_entries("http://feed.example/rss", entries, 5)
        .await;

    assert_eq!(produced, 3);
    assert_eq!(pipeline.stats().articles_processed, 3);
    assert_eq!(pipeline.stats().articles_skipped, 2);

    let appended = pipeline.commit_store().unwrap();
    assert_eq!(appended, 3);

    let store = ProcessedStore::load(&config.processed_store).unwrap();
    assert_eq!(store.len(), 5);
}

#[tokio::test]
async fn processed_links_are_never_resummarized() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let entries: Vec<ArticleEntry> = (0..3)
        .map(|n| entry(n, Some("Some feed text. With two sentences.")))
        .collect();

    let mut first = Pipeline::new(config.clone(), Arc::new(MockSummarizer::new("run1"))).unwrap();
    let produced = first
        .process_entries("http://feed.example/rss", entries.clone(), 5)
        .await;
    assert_eq!(produced, 3);
    first.commit_store().unwrap();

    // A fresh run over the same entries finds everything in the store.
    let mut second = Pipeline::new(config, Arc::new(MockSummarizer::new("run2"))).unwrap();
    let produced = second
        .process_entries("http://feed.example/rss", entries, 5)
        .await;
    assert_eq!(produced, 0);
    assert_eq!(second.stats().articles_skipped, 3);
    assert!(second.report().is_empty());
}

#[tokio::test]
async fn failed_inference_is_marked_not_fatal() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let mut pipeline =
        Pipeline::new(config.clone(), Arc::new(MockSummarizer::failing("broken"))).unwrap();

    let entries = vec![entry(0, Some("Content that would have been summarized."))];
    let produced = pipeline
        .process_entries("http://feed.example/rss", entries, 5)
        .await;

    assert_eq!(produced, 1);
    assert_eq!(pipeline.stats().summaries_failed, 1);
    assert_eq!(pipeline.stats().articles_processed, 0);

    let results = pipeline.report().results().to_vec();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].summary_text, SUMMARY_FAILED);
    assert!(results[0].is_failed());

    // Failed articles stay out of the store so a later run can retry.
    assert_eq!(pipeline.commit_store().unwrap(), 0);
    assert!(!pipeline.store().is_processed(&results[0].link));
}

#[tokio::test]
async fn empty_content_passes_through_when_configured() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path(), true);
    let mut pipeline = Pipeline::new(config, Arc::new(MockSummarizer::new("empty"))).unwrap();

    // No reachable page and no feed-carried text.
    let entries = vec![entry(0, None)];
    let produced = pipeline
        .process_entries("http://feed.example/rss", entries, 5)
        .await;

    assert_eq!(produced, 1);
    let results = pipeline.report().results();
    assert_eq!(results[0].summary_text, SUMMARY_EMPTY_CONTENT);
    assert!(pipeline.store().is_processed(&results[0].link));
}

#[tokio::test]
async fn empty_content_is_skipped_by_default() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path(), false);
    let mut pipeline = Pipeline::new(config, Arc::new(MockSummarizer::new("empty"))).unwrap();

    let entries = vec![entry(0, None)];
    let produced = pipeline
        .process_entries("http://feed.example/rss", entries, 5)
        .await;

    assert_eq!(produced, 0);
    assert!(pipeline.report().is_empty());
    assert_eq!(pipeline.stats().articles_skipped, 1);
    assert_eq!(pipeline.commit_store().unwrap(), 0);
}

#[test]
fn report_escapes_html_in_titles_and_summaries() {
    let mut report = ReportBuilder::new();
    report.push(SummaryResult {
        title: "AT&T <buys> \"everything\"".to_string(),
        link: "https://example.com/a?x=1&y=2".to_string(),
        summary_text: "1 < 2 & 3 > 2".to_string(),
    });

    let html = report.render_html();
    assert!(html.contains("AT&amp;T &lt;buys&gt; &quot;everything&quot;"));
    assert!(html.contains("https://example.com/a?x=1&amp;y=2"));
    assert!(html.contains("1 &lt; 2 &amp; 3 &gt; 2"));
    assert!(!html.contains("<buys>"));
}

#[test]
fn report_write_creates_directory_and_file() {
    let dir = tempdir().unwrap();
    let report_dir = dir.path().join("nested").join("reports");

    let mut report = ReportBuilder::new();
    report.push(SummaryResult {
        title: "Title".to_string(),
        link: "https://example.com/a".to_string(),
        summary_text: "Summary.".to_string(),
    });

    let path = report.write(&report_dir).unwrap();
    assert!(path.exists());
    let html = fs::read_to_string(path).unwrap();
    assert!(html.contains("<h2><a href=\"https://example.com/a\">Title</a></h2>"));
}

#[test]
fn config_defaults_and_feed_resolution() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("settings.json");
    let feeds_path = dir.path().join("feeds.txt");

    fs::write(
        &feeds_path,
        "# comment line\nhttps://example.com/feed-a.xml\n\n  https://example.com/feed-b.xml  \n",
    )
    .unwrap();

    fs::write(
        &config_path,
        format!(
            r#"{{
                "feeds": [{{"url": "https://example.com/feed-a.xml", "max_articles": 2}}],
                "feeds_file": {:?},
                "articles_per_feed": 7,
                "model": {{"endpoint": "http://127.0.0.1:11434", "model": "llama3.2"}}
            }}"#,
            feeds_path
        ),
    )
    .unwrap();

    let config = AppConfig::load(&config_path).unwrap();
    assert_eq!(config.articles_per_feed, 7);
    assert!(!config.allow_empty_excerpts);
    assert_eq!(config.fetch.timeout_seconds, 30);

    let sources = config.feed_sources().unwrap();
    // Inline declaration wins for feed-a; feed-b comes from the file with
    // the global limit.
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].url, "https://example.com/feed-a.xml");
    assert_eq!(sources[0].max_articles, 2);
    assert_eq!(sources[1].url, "https://example.com/feed-b.xml");
    assert_eq!(sources[1].max_articles, 7);
}

#[test]
fn missing_config_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(AppConfig::load(&dir.path().join("nope.json")).is_err());
}
