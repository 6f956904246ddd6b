//! The scheduled per-user job: one plan per opted-in user.
//!
//! One user's failure is logged and skipped; it never aborts the rest of
//! the batch.

use anyhow::Result;
use sqlx::PgPool;

use baba_core::ai::RecipeAi;
use baba_core::orchestrator::{PipelineConfig, run_pipeline};
use baba_core::request::{self, PlanRequest};
use baba_db::models::PlanSource;
use baba_db::queries::preferences;

/// Generate a weekly plan for every user opted into `auto_plan`.
pub async fn run_schedule(pool: &PgPool, ai: &dyn RecipeAi) -> Result<()> {
    let users = preferences::list_auto_plan_users(pool).await?;

    if users.is_empty() {
        println!("No users opted into scheduled plans.");
        return Ok(());
    }

    let config = PipelineConfig::default();
    let mut generated = 0usize;
    let mut failed = 0usize;

    for prefs in &users {
        let mut req = PlanRequest::new(&prefs.user_id, PlanSource::Scheduled);
        req.include_shopping_list = true;
        request::apply_stored_defaults(&mut req, prefs);

        match run_pipeline(pool, ai, None, &req, &config).await {
            Ok(output) => {
                generated += 1;
                tracing::info!(
                    user_id = %prefs.user_id,
                    plan_id = %output.plan_id,
                    "scheduled plan generated"
                );
                println!("  {}: plan {}", prefs.user_id, output.plan_id);
            }
            Err(e) => {
                failed += 1;
                tracing::error!(
                    user_id = %prefs.user_id,
                    error = %format!("{e:#}"),
                    "scheduled plan generation failed"
                );
                println!("  {}: FAILED ({e:#})", prefs.user_id);
            }
        }
    }

    println!("Scheduled run complete: {generated} generated, {failed} failed.");
    Ok(())
}
