//! Ingestion job models and the staged (extracted-but-unreviewed) recipe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an ingestion job.
///
/// Valid transitions: pending → processing → staged | failed, and
/// staged → confirmed. `failed` and `confirmed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Staged,
    Failed,
    Confirmed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Staged => "staged",
            Self::Failed => "failed",
            Self::Confirmed => "confirmed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "staged" => Some(Self::Staged),
            "failed" => Some(Self::Failed),
            "confirmed" => Some(Self::Confirmed),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Confirmed)
    }
}

/// Source of the raw input for an ingestion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    TextBlob,
    Url,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextBlob => "text_blob",
            Self::Url => "url",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text_blob" => Some(Self::TextBlob),
            "url" => Some(Self::Url),
            _ => None,
        }
    }
}

/// An ingestion job row.
///
/// `staged_data` holds the serialized [`StagedRecipe`] and is non-null
/// exactly when the status is `staged` or `confirmed`.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionJob {
    pub id: Uuid,
    pub job_type: JobType,
    pub raw_input: String,
    pub status: JobStatus,
    pub staged_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IngestionJob {
    /// Deserialize the staged payload, if present.
    pub fn staged_recipe(&self) -> Option<serde_json::Result<StagedRecipe>> {
        self.staged_data.as_deref().map(serde_json::from_str)
    }
}

/// An extracted recipe awaiting review, not yet persisted.
///
/// The shape mirrors what the extraction backend is instructed to emit.
/// Stored bytes are never trusted as pre-validated: this struct is re-parsed
/// from `staged_data` before any transition decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedRecipe {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<StagedIngredient>,
}

/// An ingredient as extracted, before canonical resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedIngredient {
    /// Free-text name as extracted from the source.
    pub name: String,
    /// Canonical id when the extraction pipeline already resolved it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in ["pending", "processing", "staged", "failed", "confirmed"] {
            assert_eq!(JobStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(JobStatus::from_str("bogus").is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Confirmed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Staged.is_terminal());
    }

    #[test]
    fn test_staged_recipe_minimal_json() {
        let staged: StagedRecipe =
            serde_json::from_str(r#"{"title":"Soup","ingredients":[{"name":"water"}]}"#).unwrap();
        assert_eq!(staged.title, "Soup");
        assert!(staged.steps.is_empty());
        assert_eq!(staged.ingredients.len(), 1);
        assert_eq!(staged.ingredients[0].name, "water");
        assert!(staged.ingredients[0].ingredient_id.is_none());
        assert!(!staged.ingredients[0].is_optional);
    }

    #[test]
    fn test_staged_recipe_omits_empty_fields() {
        let staged = StagedRecipe {
            title: "Toast".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&staged).unwrap();
        assert_eq!(json, r#"{"title":"Toast","ingredients":[]}"#);
    }
}
