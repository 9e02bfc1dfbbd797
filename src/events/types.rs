//! Event payloads exchanged with the ingestion pipeline.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::JobType;

/// Topic exchange all recipe events flow through.
pub const EXCHANGE_NAME: &str = "larder.topic";

/// Routing key for import requests published by this service.
pub const IMPORT_REQUESTED_KEY: &str = "recipe.import.requested";

/// Routing key for import results emitted by the pipeline.
pub const IMPORTED_KEY: &str = "recipe.imported";

/// Durable queue this service consumes import results from.
pub const IMPORTED_QUEUE: &str = "recipes.recipe-imported";

/// Published when an ingest job is submitted and extraction is delegated
/// to the out-of-process pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRequestedEvent {
    pub job_id: Uuid,
    pub job_type: JobType,
    pub raw_input: String,
    pub timestamp: String,
}

impl ImportRequestedEvent {
    pub fn new(job_id: Uuid, job_type: JobType, raw_input: &str) -> Self {
        Self {
            job_id,
            job_type,
            raw_input: raw_input.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Emitted by the pipeline after extraction completes or fails.
///
/// Status defaults to `staged` when omitted; `failed` carries an optional
/// error string. `staged_data` holds the structured payload for staged
/// results and is validated before any job mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedEvent {
    pub job_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staged_data: Option<serde_json::Value>,
}

impl ImportedEvent {
    /// Effective status with the `staged` default applied.
    pub fn effective_status(&self) -> &str {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => "staged",
            Some(s) => s,
        }
    }
}
