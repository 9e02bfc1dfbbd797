//! Environment-based configuration.
//!
//! Everything is read once at startup. A `.env` file is honored when present
//! (loaded in main before this runs).

use std::env;

use crate::llm::LlmConfig;

/// Runtime settings for the service.
#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite database path or `sqlite:` URL.
    pub database_url: String,
    /// Base URL of the ingredient dictionary service. Without it, confirming
    /// staged recipes with unresolved ingredient names fails.
    pub dictionary_url: Option<String>,
    /// AMQP broker URL. When set, ingestion is delegated to the import
    /// pipeline; when unset, extraction runs in-process.
    pub amqp_url: Option<String>,
    pub llm: LlmConfig,
}

impl Settings {
    pub fn from_env() -> Self {
        let mut llm = LlmConfig::default();
        if let Ok(v) = env::var("LLM_ENABLED") {
            llm.enabled = !matches!(v.to_lowercase().as_str(), "0" | "false" | "no");
        }
        if let Ok(v) = env::var("LLM_ENDPOINT") {
            llm.endpoint = v;
        }
        if let Ok(v) = env::var("LLM_MODEL") {
            llm.model = v;
        }
        if let Some(v) = env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()) {
            llm.max_tokens = v;
        }
        if let Some(v) = env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()) {
            llm.temperature = v;
        }

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "larder.db".to_string()),
            dictionary_url: env::var("DICTIONARY_URL").ok().filter(|v| !v.is_empty()),
            amqp_url: env::var("AMQP_URL").ok().filter(|v| !v.is_empty()),
            llm,
        }
    }
}
