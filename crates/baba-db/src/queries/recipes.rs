//! Database query functions for the `recipes` table (the shared catalog).
//!
//! Writes are append-only and never deduplicated: every slot
//! materialization mints a fresh recipe row, tagged with its origin and the
//! description that produced it.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Recipe;

/// Parameters for inserting a new recipe row.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub recipe_title: String,
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
    pub cuisine_type: String,
    pub cooking_difficulty: String,
    pub cooking_time: String,
    pub diet: Vec<String>,
    pub origin: String,
    pub origin_description: Option<String>,
}

/// Insert a new recipe row. Returns the inserted recipe with
/// server-generated defaults (id, created_at).
pub async fn insert_recipe(pool: &PgPool, new: &NewRecipe) -> Result<Recipe> {
    let recipe = sqlx::query_as::<_, Recipe>(
        "INSERT INTO recipes \
             (recipe_title, ingredients, directions, cuisine_type, cooking_difficulty, \
              cooking_time, diet, origin, origin_description) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(&new.recipe_title)
    .bind(&new.ingredients)
    .bind(&new.directions)
    .bind(&new.cuisine_type)
    .bind(&new.cooking_difficulty)
    .bind(&new.cooking_time)
    .bind(&new.diet)
    .bind(&new.origin)
    .bind(&new.origin_description)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert recipe {:?}", new.recipe_title))?;

    Ok(recipe)
}

/// Fetch a recipe by its ID.
pub async fn get_recipe(pool: &PgPool, id: Uuid) -> Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch recipe")?;

    Ok(recipe)
}

/// Count all recipes in the catalog. Used by tests to assert write counts.
pub async fn count_recipes(pool: &PgPool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await
        .context("failed to count recipes")?;

    Ok(row.0)
}
