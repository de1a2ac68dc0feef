use crate::types::{Result, SummaryResult};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Accumulates summaries in processing order and renders the run's HTML
/// report artifact.
pub struct ReportBuilder {
    results: Vec<SummaryResult>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: SummaryResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[SummaryResult] {
        &self.results
    }

    /// Renders the report as a static HTML document.
    pub fn render_html(&self) -> String {
        let heading = Local::now().format("%A, %B %d, %Y");

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
        html.push_str("<title>Feed Summary Report</title>\n</head>\n<body>\n");
        html.push_str(&format!("<h1>Feed summaries for {}</h1>\n", heading));

        for result in &self.results {
            html.push_str(&format!(
                "<h2><a href=\"{}\">{}</a></h2>\n",
                escape(&result.link),
                escape(&result.title)
            ));
            html.push_str(&format!("<p>{}</p>\n", escape(&result.summary_text)));
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Writes the report into `report_dir` under a timestamped name,
    /// creating the directory when absent. Returns the written path.
    pub fn write(&self, report_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(report_dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = report_dir.join(format!("report_{}.html", timestamp));
        fs::write(&path, self.render_html())?;

        info!(path = %path.display(), entries = self.results.len(), "Report written");
        Ok(path)
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
