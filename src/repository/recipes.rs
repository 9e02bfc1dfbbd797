//! Recipe aggregate persistence.
//!
//! The aggregate (recipe + steps + ingredients) is only ever written inside
//! a single transaction: all rows land or none do. Updates replace child
//! rows wholesale rather than merging.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use super::diesel_models::{
    NewRecipe, NewRecipeIngredient, NewRecipeStep, RecipeIngredientRecord, RecipeRecord,
    RecipeStepRecord,
};
use super::pool::{DbError, SqliteConn, SqlitePool};
use crate::models::{Recipe, RecipeDetail, RecipeIngredient, RecipeStep};
use crate::schema::{recipe_ingredients, recipe_steps, recipes};

/// An ingredient line whose canonical id is already known.
#[derive(Debug, Clone)]
pub struct ResolvedIngredient {
    pub ingredient_id: Uuid,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub is_optional: bool,
    pub preparation_notes: Option<String>,
}

/// Scalar fields and children for creating or replacing a recipe.
#[derive(Debug, Clone, Default)]
pub struct RecipeWrite {
    pub title: String,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub servings: Option<i32>,
    pub prep_minutes: Option<i32>,
    pub cook_minutes: Option<i32>,
    pub tags: Vec<String>,
    /// Instructions in order; step numbers are assigned from position.
    pub steps: Vec<String>,
    pub ingredients: Vec<ResolvedIngredient>,
}

/// Insert a recipe row.
pub(crate) async fn insert_recipe(conn: &mut SqliteConn, row: &NewRecipe<'_>) -> Result<(), DbError> {
    diesel::insert_into(recipes::table)
        .values(row)
        .execute(conn)
        .await?;
    Ok(())
}

/// Insert a single step row.
pub(crate) async fn insert_step(
    conn: &mut SqliteConn,
    row: &NewRecipeStep<'_>,
) -> Result<(), DbError> {
    diesel::insert_into(recipe_steps::table)
        .values(row)
        .execute(conn)
        .await?;
    Ok(())
}

/// Insert a single ingredient row.
pub(crate) async fn insert_ingredient(
    conn: &mut SqliteConn,
    row: &NewRecipeIngredient<'_>,
) -> Result<(), DbError> {
    diesel::insert_into(recipe_ingredients::table)
        .values(row)
        .execute(conn)
        .await?;
    Ok(())
}

/// Delete all child rows (steps and ingredients) for a recipe.
pub(crate) async fn delete_children(conn: &mut SqliteConn, recipe_id: &str) -> Result<(), DbError> {
    diesel::delete(recipe_steps::table.filter(recipe_steps::recipe_id.eq(recipe_id)))
        .execute(conn)
        .await?;
    diesel::delete(
        recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)),
    )
    .execute(conn)
    .await?;
    Ok(())
}

/// Repository for recipe CRUD operations.
#[derive(Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a recipe aggregate in one transaction.
    pub async fn create(&self, write: &RecipeWrite) -> Result<Recipe, DbError> {
        let mut conn = self.pool.get().await?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let tags_json =
            serde_json::to_string(&write.tags).map_err(super::pool::to_db_error)?;

        conn.transaction::<_, DbError, _>(|conn| {
            let id = id.clone();
            let now = now.clone();
            let tags_json = tags_json.clone();
            Box::pin(async move {
                insert_recipe(
                    conn,
                    &NewRecipe {
                        id: &id,
                        title: &write.title,
                        description: write.description.as_deref(),
                        source_url: write.source_url.as_deref(),
                        servings: write.servings,
                        prep_minutes: write.prep_minutes,
                        cook_minutes: write.cook_minutes,
                        tags: &tags_json,
                        created_at: &now,
                        updated_at: &now,
                    },
                )
                .await?;

                insert_children(conn, &id, write).await?;
                Ok(())
            })
        })
        .await?;

        self.get(&id).await?.ok_or(DbError::NotFound)
    }

    /// Replace a recipe's scalar fields and all child rows in one transaction.
    ///
    /// Returns `None` when the recipe does not exist.
    pub async fn update(&self, id: Uuid, write: &RecipeWrite) -> Result<Option<Recipe>, DbError> {
        let id_str = id.to_string();
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();
        let tags_json =
            serde_json::to_string(&write.tags).map_err(super::pool::to_db_error)?;

        let updated = conn
            .transaction::<_, DbError, _>(|conn| {
                let id_str = id_str.clone();
                let now = now.clone();
                let tags_json = tags_json.clone();
                Box::pin(async move {
                    let rows = diesel::update(recipes::table.find(&id_str))
                        .set((
                            recipes::title.eq(&write.title),
                            recipes::description.eq(write.description.as_deref()),
                            recipes::source_url.eq(write.source_url.as_deref()),
                            recipes::servings.eq(write.servings),
                            recipes::prep_minutes.eq(write.prep_minutes),
                            recipes::cook_minutes.eq(write.cook_minutes),
                            recipes::tags.eq(&tags_json),
                            recipes::updated_at.eq(&now),
                        ))
                        .execute(conn)
                        .await?;

                    if rows == 0 {
                        return Ok(false);
                    }

                    delete_children(conn, &id_str).await?;
                    insert_children(conn, &id_str, write).await?;
                    Ok(true)
                })
            })
            .await?;

        if !updated {
            return Ok(None);
        }
        self.get(&id_str).await
    }

    /// Fetch a recipe by id.
    pub async fn get(&self, id: &str) -> Result<Option<Recipe>, DbError> {
        let mut conn = self.pool.get().await?;
        let rec: Option<RecipeRecord> = recipes::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()?;
        rec.map(Recipe::try_from).transpose()
    }

    /// Fetch a recipe with its steps and ingredients.
    pub async fn get_detail(&self, id: Uuid) -> Result<Option<RecipeDetail>, DbError> {
        let id_str = id.to_string();
        let Some(recipe) = self.get(&id_str).await? else {
            return Ok(None);
        };

        let mut conn = self.pool.get().await?;
        let step_recs: Vec<RecipeStepRecord> = recipe_steps::table
            .filter(recipe_steps::recipe_id.eq(&id_str))
            .order(recipe_steps::step_number.asc())
            .load(&mut conn)
            .await?;
        let ing_recs: Vec<RecipeIngredientRecord> = recipe_ingredients::table
            .filter(recipe_ingredients::recipe_id.eq(&id_str))
            .order(recipe_ingredients::id.asc())
            .load(&mut conn)
            .await?;

        let steps = step_recs
            .into_iter()
            .map(RecipeStep::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let ingredients = ing_recs
            .into_iter()
            .map(RecipeIngredient::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(RecipeDetail {
            recipe,
            steps,
            ingredients,
        }))
    }

    /// List all recipes, most recently created first.
    pub async fn list(&self) -> Result<Vec<Recipe>, DbError> {
        let mut conn = self.pool.get().await?;
        let recs: Vec<RecipeRecord> = recipes::table
            .order(recipes::created_at.desc())
            .load(&mut conn)
            .await?;
        recs.into_iter().map(Recipe::try_from).collect()
    }

    /// List recipes whose tag set contains the given tag.
    ///
    /// Membership is exact: a query for "soup" does not match "soups".
    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<Recipe>, DbError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.tags.iter().any(|t| t == tag))
            .collect())
    }

    /// List recipes whose title contains the given substring.
    pub async fn list_by_title(&self, query: &str) -> Result<Vec<Recipe>, DbError> {
        let mut conn = self.pool.get().await?;
        let pattern = format!("%{}%", query);
        let recs: Vec<RecipeRecord> = recipes::table
            .filter(recipes::title.like(pattern))
            .order(recipes::created_at.desc())
            .load(&mut conn)
            .await?;
        recs.into_iter().map(Recipe::try_from).collect()
    }

    /// List recipes with cook_minutes at or under the given maximum.
    pub async fn list_by_cook_time(&self, max_minutes: i32) -> Result<Vec<Recipe>, DbError> {
        let mut conn = self.pool.get().await?;
        let recs: Vec<RecipeRecord> = recipes::table
            .filter(recipes::cook_minutes.le(max_minutes))
            .order(recipes::created_at.desc())
            .load(&mut conn)
            .await?;
        recs.into_iter().map(Recipe::try_from).collect()
    }

    /// Delete a recipe and its children. Returns false when not found.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let id_str = id.to_string();
        let mut conn = self.pool.get().await?;

        conn.transaction(|conn| {
            Box::pin(async move {
                delete_children(conn, &id_str).await?;
                let rows = diesel::delete(recipes::table.find(&id_str))
                    .execute(conn)
                    .await?;
                Ok(rows > 0)
            })
        })
        .await
    }

    /// Count steps and ingredients for a recipe (test support and stats).
    pub async fn child_counts(&self, id: Uuid) -> Result<(i64, i64), DbError> {
        use diesel::dsl::count_star;
        let id_str = id.to_string();
        let mut conn = self.pool.get().await?;

        let steps: i64 = recipe_steps::table
            .filter(recipe_steps::recipe_id.eq(&id_str))
            .select(count_star())
            .get_result(&mut conn)
            .await?;
        let ingredients: i64 = recipe_ingredients::table
            .filter(recipe_ingredients::recipe_id.eq(&id_str))
            .select(count_star())
            .get_result(&mut conn)
            .await?;
        Ok((steps, ingredients))
    }

    /// Count all recipe rows.
    pub async fn count(&self) -> Result<i64, DbError> {
        use diesel::dsl::count_star;
        let mut conn = self.pool.get().await?;
        recipes::table
            .select(count_star())
            .get_result(&mut conn)
            .await
    }
}

/// Insert step and ingredient rows for a recipe, numbering steps by position.
async fn insert_children(
    conn: &mut SqliteConn,
    recipe_id: &str,
    write: &RecipeWrite,
) -> Result<(), DbError> {
    for (i, instruction) in write.steps.iter().enumerate() {
        insert_step(
            conn,
            &NewRecipeStep {
                recipe_id,
                step_number: i as i32 + 1,
                instruction,
            },
        )
        .await?;
    }

    for ing in &write.ingredients {
        let ingredient_id = ing.ingredient_id.to_string();
        insert_ingredient(
            conn,
            &NewRecipeIngredient {
                recipe_id,
                ingredient_id: &ingredient_id,
                quantity: ing.quantity,
                unit: ing.unit.as_deref(),
                is_optional: ing.is_optional,
                preparation_notes: ing.preparation_notes.as_deref(),
            },
        )
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_pool;

    fn sample_write() -> RecipeWrite {
        RecipeWrite {
            title: "Pasta".to_string(),
            description: Some("Quick dinner".to_string()),
            servings: Some(2),
            cook_minutes: Some(15),
            tags: vec!["dinner".to_string(), "pasta".to_string()],
            steps: vec!["boil pasta".to_string(), "add sauce".to_string()],
            ingredients: vec![ResolvedIngredient {
                ingredient_id: Uuid::new_v4(),
                quantity: Some(1.0),
                unit: Some("lb".to_string()),
                is_optional: false,
                preparation_notes: None,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_detail() {
        let (pool, _dir) = test_pool().await;
        let repo = RecipeRepository::new(pool);

        let recipe = repo.create(&sample_write()).await.unwrap();
        assert_eq!(recipe.title, "Pasta");
        assert_eq!(recipe.tags, vec!["dinner", "pasta"]);

        let detail = repo.get_detail(recipe.id).await.unwrap().unwrap();
        assert_eq!(detail.steps.len(), 2);
        assert_eq!(detail.steps[0].step_number, 1);
        assert_eq!(detail.steps[1].step_number, 2);
        assert_eq!(detail.steps[0].instruction, "boil pasta");
        assert_eq!(detail.ingredients.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_children() {
        let (pool, _dir) = test_pool().await;
        let repo = RecipeRepository::new(pool);

        let recipe = repo.create(&sample_write()).await.unwrap();

        let mut write = sample_write();
        write.title = "Pasta v2".to_string();
        write.steps = vec!["do everything at once".to_string()];
        write.ingredients.clear();

        let updated = repo.update(recipe.id, &write).await.unwrap().unwrap();
        assert_eq!(updated.title, "Pasta v2");

        let detail = repo.get_detail(recipe.id).await.unwrap().unwrap();
        assert_eq!(detail.steps.len(), 1);
        assert_eq!(detail.steps[0].step_number, 1);
        assert!(detail.ingredients.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_recipe() {
        let (pool, _dir) = test_pool().await;
        let repo = RecipeRepository::new(pool);

        let result = repo.update(Uuid::new_v4(), &sample_write()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_tag_filter_is_exact_membership() {
        let (pool, _dir) = test_pool().await;
        let repo = RecipeRepository::new(pool);

        let mut write = sample_write();
        write.tags = vec!["soup".to_string()];
        repo.create(&write).await.unwrap();

        let mut write = sample_write();
        write.title = "Other".to_string();
        write.tags = vec!["soups".to_string()];
        repo.create(&write).await.unwrap();

        let hits = repo.list_by_tag("soup").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tags, vec!["soup"]);
    }

    #[tokio::test]
    async fn test_delete_removes_children() {
        let (pool, _dir) = test_pool().await;
        let repo = RecipeRepository::new(pool);

        let recipe = repo.create(&sample_write()).await.unwrap();
        assert!(repo.delete(recipe.id).await.unwrap());
        assert!(repo.get_detail(recipe.id).await.unwrap().is_none());

        let (steps, ingredients) = repo.child_counts(recipe.id).await.unwrap();
        assert_eq!(steps, 0);
        assert_eq!(ingredients, 0);

        // Second delete reports not found
        assert!(!repo.delete(recipe.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_cook_time_filter() {
        let (pool, _dir) = test_pool().await;
        let repo = RecipeRepository::new(pool);

        repo.create(&sample_write()).await.unwrap();
        let mut slow = sample_write();
        slow.title = "Stew".to_string();
        slow.cook_minutes = Some(180);
        repo.create(&slow).await.unwrap();

        let quick = repo.list_by_cook_time(30).await.unwrap();
        assert_eq!(quick.len(), 1);
        assert_eq!(quick[0].title, "Pasta");
    }
}
