//! LLM client configuration.

use serde::{Deserialize, Serialize};

use super::prompts::DEFAULT_EXTRACT_PROMPT;

/// Configuration for the extraction LLM client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether direct (synchronous) LLM extraction is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Ollama-compatible API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model to use for extraction
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0); extraction wants determinism
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Custom extraction prompt (uses the {text} placeholder)
    #[serde(default)]
    pub extract_prompt: Option<String>,
    /// Maximum characters of raw input to send to the model
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl LlmConfig {
    pub fn get_extract_prompt(&self) -> &str {
        self.extract_prompt.as_deref().unwrap_or(DEFAULT_EXTRACT_PROMPT)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_content_chars() -> usize {
    16_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            extract_prompt: None,
            max_content_chars: default_max_content_chars(),
        }
    }
}
