pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod summarizer;
pub mod types;

pub use config::AppConfig;
pub use extractor::extract_excerpt;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use pipeline::Pipeline;
pub use report::ReportBuilder;
pub use store::ProcessedStore;
pub use summarizer::{MockSummarizer, OllamaSummarizer, Summarize};
pub use types::*;
