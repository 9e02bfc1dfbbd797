//! Diesel ORM models for database tables.
//!
//! These records provide compile-time type checking for database operations.
//! UUIDs and timestamps are stored as TEXT; conversions to the domain models
//! validate them on the way out.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::pool::{to_db_error, DbError};
use crate::models::{IngestionJob, JobStatus, JobType, Recipe, RecipeIngredient, RecipeStep};
use crate::schema;

/// Recipe record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::recipes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecipeRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub servings: Option<i32>,
    pub prep_minutes: Option<i32>,
    pub cook_minutes: Option<i32>,
    pub tags: String,
    pub created_at: String,
    pub updated_at: String,
}

/// New recipe for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::recipes)]
pub struct NewRecipe<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub source_url: Option<&'a str>,
    pub servings: Option<i32>,
    pub prep_minutes: Option<i32>,
    pub cook_minutes: Option<i32>,
    pub tags: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Recipe step record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::recipe_steps)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecipeStepRecord {
    pub id: i32,
    pub recipe_id: String,
    pub step_number: i32,
    pub instruction: String,
}

/// New recipe step for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::recipe_steps)]
pub struct NewRecipeStep<'a> {
    pub recipe_id: &'a str,
    pub step_number: i32,
    pub instruction: &'a str,
}

/// Recipe ingredient record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::recipe_ingredients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RecipeIngredientRecord {
    pub id: i32,
    pub recipe_id: String,
    pub ingredient_id: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub is_optional: bool,
    pub preparation_notes: Option<String>,
}

/// New recipe ingredient for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::recipe_ingredients)]
pub struct NewRecipeIngredient<'a> {
    pub recipe_id: &'a str,
    pub ingredient_id: &'a str,
    pub quantity: Option<f64>,
    pub unit: Option<&'a str>,
    pub is_optional: bool,
    pub preparation_notes: Option<&'a str>,
}

/// Ingestion job record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::ingestion_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IngestionJobRecord {
    pub id: String,
    pub job_type: String,
    pub raw_input: String,
    pub status: String,
    pub staged_data: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New ingestion job for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::ingestion_jobs)]
pub struct NewIngestionJob<'a> {
    pub id: &'a str,
    pub job_type: &'a str,
    pub raw_input: &'a str,
    pub status: &'a str,
    pub staged_data: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| to_db_error(format!("invalid uuid {:?}: {}", s, e)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| to_db_error(format!("invalid timestamp {:?}: {}", s, e)))
}

impl TryFrom<RecipeRecord> for Recipe {
    type Error = DbError;

    fn try_from(rec: RecipeRecord) -> Result<Self, Self::Error> {
        let tags: Vec<String> = serde_json::from_str(&rec.tags)
            .map_err(|e| to_db_error(format!("invalid tags json: {}", e)))?;

        Ok(Recipe {
            id: parse_uuid(&rec.id)?,
            title: rec.title,
            description: rec.description,
            source_url: rec.source_url,
            servings: rec.servings,
            prep_minutes: rec.prep_minutes,
            cook_minutes: rec.cook_minutes,
            tags,
            created_at: parse_timestamp(&rec.created_at)?,
            updated_at: parse_timestamp(&rec.updated_at)?,
        })
    }
}

impl TryFrom<RecipeStepRecord> for RecipeStep {
    type Error = DbError;

    fn try_from(rec: RecipeStepRecord) -> Result<Self, Self::Error> {
        Ok(RecipeStep {
            recipe_id: parse_uuid(&rec.recipe_id)?,
            step_number: rec.step_number,
            instruction: rec.instruction,
        })
    }
}

impl TryFrom<RecipeIngredientRecord> for RecipeIngredient {
    type Error = DbError;

    fn try_from(rec: RecipeIngredientRecord) -> Result<Self, Self::Error> {
        Ok(RecipeIngredient {
            recipe_id: parse_uuid(&rec.recipe_id)?,
            ingredient_id: parse_uuid(&rec.ingredient_id)?,
            quantity: rec.quantity,
            unit: rec.unit,
            is_optional: rec.is_optional,
            preparation_notes: rec.preparation_notes,
        })
    }
}

impl TryFrom<IngestionJobRecord> for IngestionJob {
    type Error = DbError;

    fn try_from(rec: IngestionJobRecord) -> Result<Self, Self::Error> {
        let status = JobStatus::from_str(&rec.status)
            .ok_or_else(|| to_db_error(format!("invalid job status {:?}", rec.status)))?;
        let job_type = JobType::from_str(&rec.job_type)
            .ok_or_else(|| to_db_error(format!("invalid job type {:?}", rec.job_type)))?;

        Ok(IngestionJob {
            id: parse_uuid(&rec.id)?,
            job_type,
            raw_input: rec.raw_input,
            status,
            staged_data: rec.staged_data,
            created_at: parse_timestamp(&rec.created_at)?,
            updated_at: parse_timestamp(&rec.updated_at)?,
        })
    }
}
