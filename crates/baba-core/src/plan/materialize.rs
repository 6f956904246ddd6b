//! Slot materialization: expand one skeleton slot into a persisted recipe.
//!
//! A recipe row is ALWAYS written, whatever the synthesizer does. A failed
//! or timed-out synthesis call produces a fallback recipe built from the
//! slot description, so the plan stays structurally valid (non-empty
//! ingredient and direction lists) at the cost of quality. Failures here are
//! fully local: they never abort the batch.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tokio::time::timeout;

use baba_db::models::SlotEntry;
use baba_db::queries::recipes::{self, NewRecipe};

use crate::ai::{RecipeAi, RecipeDetails, SynthesisRequest};

use super::skeleton::SlotSkeleton;

/// Origin tag recorded on every recipe minted by the pipeline.
pub const RECIPE_ORIGIN: &str = "mealPlan";

const DEFAULT_CUISINE: &str = "international";
const DEFAULT_DIFFICULTY: &str = "medium";
const DEFAULT_COOKING_TIME: &str = "unspecified";

/// The result of materializing one slot.
#[derive(Debug, Clone)]
pub struct MaterializedSlot {
    /// The persisted slot, carrying the new recipe id.
    pub entry: SlotEntry,
    /// The recipe's ingredient strings, collected for the shopping list.
    pub ingredients: Vec<String>,
    /// True when synthesis failed and the description fallback was used.
    pub fallback: bool,
}

/// Materialize one skeleton slot into a persisted recipe.
///
/// Returns `Err` only when the recipe WRITE fails (terminal for the
/// invocation per the persistence policy); synthesis errors and timeouts
/// are absorbed into the fallback.
pub async fn materialize_slot(
    pool: &PgPool,
    ai: &dyn RecipeAi,
    slot: &SlotSkeleton,
    synthesis_timeout: Duration,
) -> Result<MaterializedSlot> {
    let request = SynthesisRequest {
        recipe_title: slot.recipe_name.clone(),
        content_hint: content_hint(slot),
        generate_all: true,
    };

    let (new_recipe, fallback) = match timeout(synthesis_timeout, ai.recipe_details(&request)).await
    {
        Ok(Ok(details)) => (recipe_from_details(slot, details), false),
        Ok(Err(e)) => {
            tracing::warn!(
                recipe_name = %slot.recipe_name,
                error = %e,
                "recipe synthesis failed, writing fallback recipe"
            );
            (fallback_recipe(slot), true)
        }
        Err(_) => {
            tracing::warn!(
                recipe_name = %slot.recipe_name,
                timeout_secs = synthesis_timeout.as_secs(),
                "recipe synthesis timed out, writing fallback recipe"
            );
            (fallback_recipe(slot), true)
        }
    };

    let recipe = recipes::insert_recipe(pool, &new_recipe)
        .await
        .with_context(|| format!("failed to persist recipe {:?}", slot.recipe_name))?;

    Ok(MaterializedSlot {
        entry: SlotEntry {
            time_slot: slot.time_slot,
            recipe_name: slot.recipe_name.clone(),
            description: slot.description.clone(),
            recipe_id: recipe.id,
        },
        ingredients: recipe.ingredients,
        fallback,
    })
}

/// The synthesis hint: name plus description.
fn content_hint(slot: &SlotSkeleton) -> String {
    if slot.description.is_empty() {
        slot.recipe_name.clone()
    } else {
        format!("{}: {}", slot.recipe_name, slot.description)
    }
}

/// Build a recipe from whatever fields the synthesizer returned, defaulting
/// the rest. Missing or empty ingredient/direction lists fall back to the
/// description so the persisted lists are never empty.
fn recipe_from_details(slot: &SlotSkeleton, details: RecipeDetails) -> NewRecipe {
    let description_fallback = || vec![slot.description.clone()];

    NewRecipe {
        recipe_title: slot.recipe_name.clone(),
        ingredients: details
            .ingredients
            .filter(|v| !v.is_empty())
            .unwrap_or_else(description_fallback),
        directions: details
            .directions
            .filter(|v| !v.is_empty())
            .unwrap_or_else(description_fallback),
        cuisine_type: details
            .cuisine_type
            .unwrap_or_else(|| DEFAULT_CUISINE.to_string()),
        cooking_difficulty: details
            .cooking_difficulty
            .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
        cooking_time: details
            .cooking_time
            .unwrap_or_else(|| DEFAULT_COOKING_TIME.to_string()),
        diet: details.diet.unwrap_or_default(),
        origin: RECIPE_ORIGIN.to_string(),
        origin_description: Some(origin_description(slot, details.recipe_summary)),
    }
}

/// Build the description-only fallback recipe used when synthesis fails.
fn fallback_recipe(slot: &SlotSkeleton) -> NewRecipe {
    NewRecipe {
        recipe_title: slot.recipe_name.clone(),
        ingredients: vec![slot.description.clone()],
        directions: vec![slot.description.clone()],
        cuisine_type: DEFAULT_CUISINE.to_string(),
        cooking_difficulty: DEFAULT_DIFFICULTY.to_string(),
        cooking_time: DEFAULT_COOKING_TIME.to_string(),
        diet: Vec::new(),
        origin: RECIPE_ORIGIN.to_string(),
        origin_description: Some(origin_description(slot, None)),
    }
}

fn origin_description(slot: &SlotSkeleton, summary: Option<String>) -> String {
    summary.unwrap_or_else(|| slot.description.clone())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
