//! Answer generation against a local language model.
//!
//! The pipeline talks to the model through [`AnswerGenerator`] only: one
//! prompt in, one completion out. [`OllamaGenerator`] is the shipped
//! implementation and calls Ollama's non-streaming `POST /api/generate`.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::LlmConfig;
use crate::http::post_json_with_retry;

/// A language model that completes a prompt.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Model identifier, for logs and diagnostics.
    fn model(&self) -> &str;

    /// Complete `prompt` and return the generated text.
    async fn invoke(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// [`AnswerGenerator`] backed by an Ollama server.
pub struct OllamaGenerator {
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the server with `GET /api/tags` and return the names of the
    /// models it has pulled.
    pub async fn health_check(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Ollama is not reachable at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Ollama health check failed: HTTP {}", status);
        }

        let json: serde_json::Value = response.json().await?;
        parse_tags_response(&json)
    }
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };
        let body = serde_json::to_value(&request)?;
        let url = format!("{}/api/generate", self.base_url);

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "Calling Ollama generate");
        let json = post_json_with_retry(&self.client, &url, &body, self.max_retries, "Ollama").await?;
        parse_generate_response(&json)
    }
}

fn parse_generate_response(json: &serde_json::Value) -> Result<String> {
    if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
        bail!("Ollama error: {}", err);
    }
    json.get("response")
        .and_then(|r| r.as_str())
        .map(|r| r.trim().to_string())
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing response field"))
}

fn parse_tags_response(json: &serde_json::Value) -> Result<Vec<String>> {
    let models = json
        .get("models")
        .and_then(|m| m.as_array())
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing models array"))?;

    Ok(models
        .iter()
        .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
        .map(str::to_string)
        .collect())
}
