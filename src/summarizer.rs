use crate::config::ModelConfig;
use crate::types::{Result, SummarizerError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Built-in prompt used when the config does not override it.
pub const DEFAULT_PROMPT: &str = "Read the following article and respond with a concise, \
clear summary covering the main points and key information. Keep the summary objective. \
Do not add any text before or after the summary itself.";

/// Seam for the inference backend so the pipeline can run against a local
/// model server in production and a mock in tests.
#[async_trait]
pub trait Summarize: Send + Sync {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> String;

    /// Verifies the backend is usable before the batch starts. Failure here
    /// is fatal; per-article failures are not.
    async fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    /// Produces a summary for one article excerpt.
    async fn summarize(&self, excerpt: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

/// Client for an Ollama-style local inference endpoint.
pub struct OllamaSummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    prompt: String,
}

impl OllamaSummarizer {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            prompt: config
                .prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
        })
    }

    async fn chat(&self, content: String) -> Result<reqwest::Response> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&request)
            .send()
            .await?;
        Ok(response)
    }

    /// Pulls the model onto the server. Only attempted when the probe chat
    /// reports the model as missing.
    async fn pull_model(&self) -> Result<()> {
        info!(model = %self.model, "Model not found, attempting to pull");
        let response = self
            .client
            .post(format!("{}/api/pull", self.endpoint))
            .json(&PullRequest {
                name: &self.model,
                stream: false,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SummarizerError::Inference(format!(
                "failed to pull model {}: HTTP {}",
                self.model,
                response.status()
            )));
        }
        info!(model = %self.model, "Model pulled successfully");
        Ok(())
    }
}

#[async_trait]
impl Summarize for OllamaSummarizer {
    fn name(&self) -> String {
        format!("ollama ({} @ {})", self.model, self.endpoint)
    }

    async fn ensure_ready(&self) -> Result<()> {
        let response = self.chat("Test".to_string()).await?;
        let status = response.status();

        if status.is_success() {
            info!(model = %self.model, "Model is accessible");
            return Ok(());
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            self.pull_model().await?;
            let retry = self.chat("Test".to_string()).await?;
            if retry.status().is_success() {
                info!(model = %self.model, "Model pulled and accessible");
                return Ok(());
            }
            return Err(SummarizerError::Inference(format!(
                "model {} unusable after pull: HTTP {}",
                self.model,
                retry.status()
            )));
        }

        Err(SummarizerError::Inference(format!(
            "model probe failed: HTTP {}",
            status
        )))
    }

    async fn summarize(&self, excerpt: &str) -> Result<String> {
        let content = format!("{}\n\nArticle:\n{}", self.prompt, excerpt);
        debug!(chars = excerpt.len(), "Requesting summary");

        let response = self.chat(content).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SummarizerError::Inference(format!(
                "chat request failed: HTTP {}",
                status
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        let summary = normalize_summary(&parsed.message.content);
        if summary.is_empty() {
            warn!("Model returned an empty summary");
            return Err(SummarizerError::Inference("empty summary".to_string()));
        }

        debug!(chars = summary.len(), "Summary generated");
        Ok(summary)
    }
}

/// Drops blank lines and stray indentation from model output.
fn normalize_summary(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extractive stand-in for a model backend, used by tests and dry runs.
pub struct MockSummarizer {
    name: String,
    fail: bool,
}

impl MockSummarizer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail: false,
        }
    }

    /// Every summarize call returns an error, for exercising the failure
    /// marker path.
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail: true,
        }
    }
}

#[async_trait]
impl Summarize for MockSummarizer {
    fn name(&self) -> String {
        format!("mock ({})", self.name)
    }

    async fn summarize(&self, excerpt: &str) -> Result<String> {
        if self.fail {
            return Err(SummarizerError::Inference(
                "mock summarizer configured to fail".to_string(),
            ));
        }

        let sentences: Vec<&str> = excerpt
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(2)
            .collect();

        if sentences.is_empty() {
            return Err(SummarizerError::Inference("empty summary".to_string()));
        }

        Ok(format!("{}.", sentences.join(". ")))
    }
}
