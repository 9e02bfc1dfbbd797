//! Ingredient resolution against the dictionary service.
//!
//! The dictionary maps free-text ingredient names to stable canonical ids.
//! Resolving the same name twice yields an equivalent canonical record, so
//! "found" and "created" responses are treated identically.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Errors that can occur while resolving an ingredient name.
///
/// No retry logic lives here; callers decide how to treat failure.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("resolve returned status {0}")]
    Status(u16),
    #[error("malformed resolve response: {0}")]
    Parse(String),
    #[error("invalid ingredient id {0:?}")]
    InvalidId(String),
}

/// Maps a free-text ingredient name to its canonical dictionary id.
#[async_trait]
pub trait IngredientResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Uuid, ResolveError>;
}

#[derive(Debug, Serialize)]
struct ResolveRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    ingredient: ResolvedIngredientBody,
}

#[derive(Debug, Deserialize)]
struct ResolvedIngredientBody {
    id: String,
}

/// HTTP client for the dictionary's resolve endpoint.
pub struct DictionaryResolver {
    base_url: String,
    client: Client,
}

impl DictionaryResolver {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl IngredientResolver for DictionaryResolver {
    async fn resolve(&self, name: &str) -> Result<Uuid, ResolveError> {
        let url = format!("{}/ingredients/resolve", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&ResolveRequest { name })
            .send()
            .await
            .map_err(|e| ResolveError::Connection(e.to_string()))?;

        // Any 2xx is acceptable; the dictionary answers 200 for existing
        // ingredients and 201 for ones it creates on the fly.
        if !resp.status().is_success() {
            return Err(ResolveError::Status(resp.status().as_u16()));
        }

        let body: ResolveResponse = resp
            .json()
            .await
            .map_err(|e| ResolveError::Parse(e.to_string()))?;

        let id = Uuid::parse_str(&body.ingredient.id)
            .map_err(|_| ResolveError::InvalidId(body.ingredient.id.clone()))?;

        debug!(name, ingredient_id = %id, "resolved ingredient");
        Ok(id)
    }
}
