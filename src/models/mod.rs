//! Domain models for recipes and ingestion jobs.

mod ingestion;
mod recipe;

pub use ingestion::{IngestionJob, JobStatus, JobType, StagedIngredient, StagedRecipe};
pub use recipe::{Recipe, RecipeDetail, RecipeIngredient, RecipeStep};
