//! Database query functions for the `meal_plans` table.
//!
//! The plan store is append-only: plans are inserted and read, never
//! updated. Re-running the pipeline always creates a new row.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{DayEntry, MealPlan, PlanSource, PlanType, SlotEntry, Variety};

/// Parameters for inserting a new meal plan row.
#[derive(Debug, Clone)]
pub struct NewMealPlan {
    pub user_id: String,
    pub plan_type: PlanType,
    pub variety: Variety,
    pub days: Vec<DayEntry>,
    pub slots: Vec<SlotEntry>,
    pub baba_tip: String,
    pub shopping_list: Option<String>,
    pub source: PlanSource,
}

/// Insert a new plan row. Returns the inserted plan with server-generated
/// defaults (id, created_at).
pub async fn insert_plan(pool: &PgPool, new: &NewMealPlan) -> Result<MealPlan> {
    let plan = sqlx::query_as::<_, MealPlan>(
        "INSERT INTO meal_plans \
             (user_id, plan_type, variety, days, slots, baba_tip, shopping_list, source) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(&new.user_id)
    .bind(new.plan_type)
    .bind(new.variety)
    .bind(Json(&new.days))
    .bind(Json(&new.slots))
    .bind(&new.baba_tip)
    .bind(&new.shopping_list)
    .bind(new.source)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert meal plan for user {:?}", new.user_id))?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<MealPlan>> {
    let plan = sqlx::query_as::<_, MealPlan>("SELECT * FROM meal_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch meal plan")?;

    Ok(plan)
}

/// Fetch up to `limit` plans of a given type for a user, in NO guaranteed
/// order.
///
/// The store contract deliberately gives no ordering guarantee; callers that
/// need "the most recent plan" must sort by `created_at` themselves (the
/// orchestrator does, as an explicit tested step).
pub async fn recent_plans_for_user(
    pool: &PgPool,
    user_id: &str,
    plan_type: PlanType,
    limit: i64,
) -> Result<Vec<MealPlan>> {
    let plans = sqlx::query_as::<_, MealPlan>(
        "SELECT * FROM meal_plans WHERE user_id = $1 AND plan_type = $2 LIMIT $3",
    )
    .bind(user_id)
    .bind(plan_type)
    .bind(limit)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to fetch recent plans for user {user_id:?}"))?;

    Ok(plans)
}

/// List all plans for a user, newest first. Display-oriented (CLI/API
/// listings), not used by the pipeline itself.
pub async fn list_plans_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<MealPlan>> {
    let plans = sqlx::query_as::<_, MealPlan>(
        "SELECT * FROM meal_plans WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list plans for user {user_id:?}"))?;

    Ok(plans)
}
