//! Optional LLM narrative for the dashboard payload.
//!
//! The summarizer sends a prompt built purely from metric bundle
//! contents (never raw rows) to a local Ollama instance and returns a
//! short narrative string. It is never load-bearing: any failure or
//! timeout leaves the computed bundles untouched.

use crate::config::SummarizerConfig;
use crate::models::BundleSet;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "You are a data analyst writing for a university dashboard. \
Summarize the provided metrics in 3-5 plain sentences. Only reference numbers present in \
the metrics; do not invent values or trends.";

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for the free-text summarizer collaborator.
pub struct Summarizer {
    config: SummarizerConfig,
    http_client: reqwest::Client,
}

impl Summarizer {
    pub fn new(config: SummarizerConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    /// Build the deterministic prompt from bundle contents only.
    pub fn build_prompt(bundles: &BundleSet) -> String {
        let metrics = serde_json::to_string_pretty(bundles)
            .unwrap_or_else(|_| "{}".to_string());
        format!(
            "Here are the precomputed dashboard metrics for the academic, placement, and \
             faculty evaluation datasets:\n\n{metrics}\n\nWrite a short narrative summary."
        )
    }

    /// Generate the narrative, or `None` when disabled or failed.
    ///
    /// Failures are logged and swallowed; the dashboard payload simply
    /// omits the narrative.
    pub async fn narrate(&self, bundles: &BundleSet) -> Option<String> {
        if !self.config.enabled {
            return None;
        }

        let prompt = Self::build_prompt(bundles);
        match self.summarize(&prompt).await {
            Ok(narrative) => {
                info!("generated narrative summary");
                Some(narrative)
            }
            Err(error) => {
                warn!("narrative generation failed: {error:#}");
                None
            }
        }
    }

    /// Send one prompt to Ollama and return the response text.
    pub async fn summarize(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.config.ollama_url);
        debug!(%url, model = %self.config.model, "requesting summary");

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!(
                        "Request timed out after {}s",
                        self.config.timeout_seconds
                    )
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to Ollama at {}", self.config.ollama_url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Ollama API error {}: {}", status, body));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(chat_response.message.content)
    }
}
