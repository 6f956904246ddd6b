//! The `RecipeAi` trait -- the adapter interface for the generative recipe
//! service.
//!
//! The trait is intentionally object-safe so pipeline code can hold it as
//! `&dyn RecipeAi` / `Arc<dyn RecipeAi>` and tests can substitute scripted
//! implementations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::AiError;

/// Request for a lightweight plan outline (names and one-line descriptions,
/// no full recipes).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkeletonRequest {
    /// Full instruction text, including the response schema and the
    /// variety-policy directive.
    pub instructions: String,
    /// Free-text summary of the user's preferences.
    pub preference_context: String,
    /// Ingredients the user already has, if stated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients_on_hand: Option<String>,
    /// Daily calorie guidance, if a target was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_context: Option<String>,
}

/// Request for the full details of one recipe.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub recipe_title: String,
    /// Name-plus-description hint steering the synthesis.
    pub content_hint: String,
    /// Ask for every field (ingredients, directions, and metadata) at once.
    pub generate_all: bool,
}

/// Partial recipe record returned by the synthesizer.
///
/// Any or all fields may be absent; the materializer fills in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeDetails {
    pub ingredients: Option<Vec<String>>,
    pub directions: Option<Vec<String>>,
    pub cuisine_type: Option<String>,
    pub cooking_difficulty: Option<String>,
    pub cooking_time: Option<String>,
    pub diet: Option<Vec<String>>,
    pub recipe_summary: Option<String>,
}

/// A consolidated shopping list as returned by the aggregation call:
/// either grouped by category (each value a newline-joined block of items)
/// or a single flat string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsolidatedList {
    Categorized(BTreeMap<String, String>),
    Flat(String),
}

/// Adapter interface for the generative recipe service.
///
/// # Object Safety
///
/// This trait is object-safe: every method returns a concrete type. Pipeline
/// code holds it as `&dyn RecipeAi`.
#[async_trait]
pub trait RecipeAi: Send + Sync {
    /// Human-readable name for this backend (e.g. "http").
    fn name(&self) -> &str;

    /// Generate a plan skeleton. Returns the raw response text; the caller
    /// parses it tolerantly and never trusts its shape.
    async fn plan_skeleton(&self, req: &SkeletonRequest) -> Result<String, AiError>;

    /// Synthesize full recipe details for one slot.
    async fn recipe_details(&self, req: &SynthesisRequest) -> Result<RecipeDetails, AiError>;

    /// Merge a flat list of ingredient strings into a categorized shopping
    /// list. The merge is best-effort, not exact arithmetic.
    async fn consolidate_list(&self, items: &[String]) -> Result<ConsolidatedList, AiError>;
}

// Compile-time assertion: RecipeAi must be object-safe.
// If this line compiles, the trait can be used as `dyn RecipeAi`.
const _: () = {
    fn _assert_object_safe(_: &dyn RecipeAi) {}
};
