//! HTTP request handlers.

mod ingest;
mod recipes;

pub use ingest::{confirm_job, get_job, ingest};
pub use recipes::{
    create_recipe, delete_recipe, get_recipe, health, list_recipes, update_recipe,
};
