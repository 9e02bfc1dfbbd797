//! Recipe CRUD handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::super::error::ApiError;
use super::super::AppState;
use crate::models::Recipe;
use crate::repository::{RecipeWrite, ResolvedIngredient};

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// List filters. At most one is applied, in the order declared here.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub tag: Option<String>,
    pub title: Option<String>,
    pub cook_time_max: Option<i32>,
}

/// A recipe create/update payload with pre-resolved ingredients.
#[derive(Debug, Deserialize)]
pub struct RecipeInput {
    pub title: String,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub servings: Option<i32>,
    pub prep_minutes: Option<i32>,
    pub cook_minutes: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientInput>,
}

#[derive(Debug, Deserialize)]
pub struct IngredientInput {
    /// Canonical dictionary id. CRUD writes never resolve names.
    pub ingredient_id: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
    pub preparation_notes: Option<String>,
}

impl RecipeInput {
    fn into_write(self) -> Result<RecipeWrite, ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::bad_request("title must not be empty"));
        }

        let ingredients = self
            .ingredients
            .into_iter()
            .map(|i| {
                let ingredient_id = Uuid::parse_str(&i.ingredient_id).map_err(|_| {
                    ApiError::bad_request(format!("invalid ingredient id {:?}", i.ingredient_id))
                })?;
                Ok(ResolvedIngredient {
                    ingredient_id,
                    quantity: i.quantity,
                    unit: i.unit,
                    is_optional: i.is_optional,
                    preparation_notes: i.preparation_notes,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(RecipeWrite {
            title: self.title,
            description: self.description,
            source_url: self.source_url,
            servings: self.servings,
            prep_minutes: self.prep_minutes,
            cook_minutes: self.cook_minutes,
            tags: self.tags,
            steps: self.steps,
            ingredients,
        })
    }
}

fn parse_recipe_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request(format!("invalid recipe id {:?}", id)))
}

/// GET /recipes
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = if let Some(tag) = params.tag.as_deref() {
        state.recipes.list_by_tag(tag).await?
    } else if let Some(title) = params.title.as_deref() {
        state.recipes.list_by_title(title).await?
    } else if let Some(max) = params.cook_time_max {
        state.recipes.list_by_cook_time(max).await?
    } else {
        state.recipes.list().await?
    };
    Ok(Json(recipes))
}

/// POST /recipes
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(input): Json<RecipeInput>,
) -> Result<impl IntoResponse, ApiError> {
    let write = input.into_write()?;
    let recipe = state.recipes.create(&write).await?;
    let detail = state
        .recipes
        .get_detail(recipe.id)
        .await?
        .ok_or_else(ApiError::internal)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /recipes/:id
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_recipe_id(&id)?;
    let detail = state
        .recipes
        .get_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("recipe not found"))?;
    Ok(Json(detail))
}

/// PUT /recipes/:id
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RecipeInput>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_recipe_id(&id)?;
    let write = input.into_write()?;
    state
        .recipes
        .update(id, &write)
        .await?
        .ok_or_else(|| ApiError::not_found("recipe not found"))?;
    let detail = state
        .recipes
        .get_detail(id)
        .await?
        .ok_or_else(ApiError::internal)?;
    Ok(Json(detail))
}

/// DELETE /recipes/:id
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_recipe_id(&id)?;
    if !state.recipes.delete(id).await? {
        return Err(ApiError::not_found("recipe not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
