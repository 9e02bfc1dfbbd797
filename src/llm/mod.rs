//! LLM client for recipe extraction.
//!
//! Supports Ollama API for local LLM inference. The model is given a fixed
//! instruction template plus the raw input and must answer with one strict
//! JSON object matching the staged recipe shape.

mod config;
mod prompts;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use config::LlmConfig;

use crate::models::StagedRecipe;

/// Errors that can occur during extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("LLM extraction is disabled")]
    Disabled,
}

/// Turns raw text into a candidate recipe, or fails.
#[async_trait]
pub trait RecipeExtractor: Send + Sync {
    async fn extract(&self, raw_text: &str) -> Result<StagedRecipe, ExtractError>;
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

/// LLM-backed extractor for the direct (synchronous) strategy.
pub struct LlmExtractor {
    config: LlmConfig,
    client: Client,
}

impl LlmExtractor {
    /// Create a new extractor with the given configuration.
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 min timeout for slow models
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Truncate content to configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_content_chars {
            return text;
        }
        let mut end = self.config.max_content_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    /// Call Ollama API with a prompt.
    async fn call_ollama(&self, prompt: &str) -> Result<String, ExtractError> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| ExtractError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }
}

#[async_trait]
impl RecipeExtractor for LlmExtractor {
    async fn extract(&self, raw_text: &str) -> Result<StagedRecipe, ExtractError> {
        if !self.config.enabled {
            return Err(ExtractError::Disabled);
        }

        let truncated = self.truncate_content(raw_text);
        let prompt = self.config.get_extract_prompt().replace("{text}", truncated);

        debug!(model = %self.config.model, "extracting recipe");
        let response = self.call_ollama(&prompt).await?;

        parse_staged_recipe(&response)
    }
}

/// Parse the model output into a staged recipe.
///
/// Models wrap JSON in markdown fences often enough that we strip them, but
/// anything beyond that is rejected rather than repaired.
pub(crate) fn parse_staged_recipe(response: &str) -> Result<StagedRecipe, ExtractError> {
    let cleaned = strip_code_fences(response.trim());
    if cleaned.is_empty() {
        return Err(ExtractError::Parse("empty model response".to_string()));
    }

    let staged: StagedRecipe =
        serde_json::from_str(cleaned).map_err(|e| ExtractError::Parse(e.to_string()))?;

    if staged.title.trim().is_empty() {
        return Err(ExtractError::Parse(
            "extracted recipe has no title".to_string(),
        ));
    }

    Ok(staged)
}

fn strip_code_fences(text: &str) -> &str {
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}
