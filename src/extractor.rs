use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::debug;

/// Excerpts longer than this are truncated before summarization.
pub const EXCERPT_MAX_CHARS: usize = 4000;

/// Everything a heuristic may look at for one article page.
pub struct ExtractionInput<'a> {
    raw: &'a str,
    document: Html,
}

type Heuristic = fn(&ExtractionInput) -> Option<String>;

/// Ordered extraction chain: first heuristic returning non-empty text wins.
/// Content containers are tried before the regex fallback, with page
/// metadata as the last resort.
const HEURISTICS: &[(&str, Heuristic)] = &[
    ("abstract-container", abstract_container),
    ("article-body", article_body),
    ("leading-paragraphs", leading_paragraphs),
    ("abstract-regex", abstract_regex),
    ("meta-description", meta_description),
    ("og-description", og_description),
];

/// Extracts a best-effort textual excerpt from raw article HTML. Returns an
/// empty string when every heuristic comes up empty; callers treat that as
/// a valid degraded result.
pub fn extract_excerpt(html: &str) -> String {
    let input = ExtractionInput {
        raw: html,
        document: Html::parse_document(html),
    };

    for (name, heuristic) in HEURISTICS {
        if let Some(text) = heuristic(&input) {
            let text = normalize(&text);
            if !text.is_empty() {
                debug!(heuristic = name, chars = text.len(), "Extracted excerpt");
                return truncate_chars(&text, EXCERPT_MAX_CHARS);
            }
        }
    }

    debug!("No heuristic produced an excerpt");
    String::new()
}

fn select_text(input: &ExtractionInput, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let element = input.document.select(&selector).next()?;
    Some(element.text().collect::<Vec<_>>().join(" "))
}

fn abstract_container(input: &ExtractionInput) -> Option<String> {
    select_text(
        input,
        "div.abstract, div#abstract, section#abstract, section[aria-labelledby=\"abstract\"]",
    )
}

fn article_body(input: &ExtractionInput) -> Option<String> {
    select_text(input, "article")
}

fn leading_paragraphs(input: &ExtractionInput) -> Option<String> {
    let selector = Selector::parse("p").ok()?;
    let joined = input
        .document
        .select(&selector)
        .take(8)
        .map(|p| p.text().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    // A couple of stray boilerplate paragraphs are not article content.
    if joined.trim().len() < 80 {
        None
    } else {
        Some(joined)
    }
}

fn abstract_regex(input: &ExtractionInput) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?is)abstract\s*[:\-]\s*(.*?)\s*(?:introduction|1\.)")
            .expect("abstract regex is valid")
    });
    re.captures(input.raw)
        .and_then(|caps| caps.get(1))
        .map(|m| strip_tags(m.as_str()))
}

fn meta_description(input: &ExtractionInput) -> Option<String> {
    meta_content(input, "meta[name=\"description\"]")
}

fn og_description(input: &ExtractionInput) -> Option<String> {
    meta_content(input, "meta[property=\"og:description\"]")
}

fn meta_content(input: &ExtractionInput, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let element = input.document.select(&selector).next()?;
    element.value().attr("content").map(str::to_string)
}

fn strip_tags(fragment: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));
    re.replace_all(fragment, " ").into_owned()
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
