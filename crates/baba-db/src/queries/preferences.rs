//! Database query functions for the `user_preferences` table.
//!
//! Stored per-user defaults are merged into incoming plan requests by the
//! preference resolver, and `auto_plan` opts a user into the scheduled job.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::UserPreferences;

/// Parameters for upserting a user's stored defaults.
#[derive(Debug, Clone)]
pub struct NewPreferences {
    pub user_id: String,
    pub dietary_preferences: Vec<String>,
    pub preferred_cooking_oil: Option<String>,
    pub calorie_target: Option<i32>,
    pub auto_plan: bool,
}

/// Insert or replace a user's stored defaults. Returns the stored row.
pub async fn upsert_preferences(pool: &PgPool, new: &NewPreferences) -> Result<UserPreferences> {
    let prefs = sqlx::query_as::<_, UserPreferences>(
        "INSERT INTO user_preferences \
             (user_id, dietary_preferences, preferred_cooking_oil, calorie_target, auto_plan) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (user_id) DO UPDATE SET \
             dietary_preferences = EXCLUDED.dietary_preferences, \
             preferred_cooking_oil = EXCLUDED.preferred_cooking_oil, \
             calorie_target = EXCLUDED.calorie_target, \
             auto_plan = EXCLUDED.auto_plan, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(&new.user_id)
    .bind(&new.dietary_preferences)
    .bind(&new.preferred_cooking_oil)
    .bind(new.calorie_target)
    .bind(new.auto_plan)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert preferences for user {:?}", new.user_id))?;

    Ok(prefs)
}

/// Fetch a user's stored defaults, if any.
pub async fn get_preferences(pool: &PgPool, user_id: &str) -> Result<Option<UserPreferences>> {
    let prefs =
        sqlx::query_as::<_, UserPreferences>("SELECT * FROM user_preferences WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .with_context(|| format!("failed to fetch preferences for user {user_id:?}"))?;

    Ok(prefs)
}

/// List all users opted into scheduled plan generation.
pub async fn list_auto_plan_users(pool: &PgPool) -> Result<Vec<UserPreferences>> {
    let users = sqlx::query_as::<_, UserPreferences>(
        "SELECT * FROM user_preferences WHERE auto_plan ORDER BY user_id",
    )
    .fetch_all(pool)
    .await
    .context("failed to list auto-plan users")?;

    Ok(users)
}
