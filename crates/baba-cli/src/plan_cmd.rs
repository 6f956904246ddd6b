//! Operator-mode CLI handlers for `baba plan` subcommands.
//!
//! Implements:
//! - `baba plan generate ...`   -- run the pipeline with live progress
//! - `baba plan show <plan-id>` -- re-render a stored plan
//! - `baba plan list --user`    -- list a user's plans

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use baba_core::ai::RecipeAi;
use baba_core::orchestrator::{PipelineConfig, run_pipeline};
use baba_core::plan::assemble::{self, PlanDraft};
use baba_core::plan::progress::{ProgressSink, SlotProgress};
use baba_core::request::{self, PlanRequest};
use baba_db::models::{PlanSource, PlanType, TimeSlot, Variety};
use baba_db::queries::{plans as plan_queries, preferences as pref_queries};

use crate::PlanCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(
    command: PlanCommands,
    pool: &PgPool,
    ai: &dyn RecipeAi,
) -> Result<()> {
    match command {
        PlanCommands::Generate {
            user,
            prompt,
            plan_type,
            variety,
            slots,
            ingredients,
            calories,
            shopping_list,
            reuse_last_week,
        } => {
            cmd_generate(
                pool,
                ai,
                &user,
                &prompt,
                &plan_type,
                &variety,
                &slots,
                ingredients,
                calories,
                shopping_list,
                reuse_last_week,
            )
            .await
        }
        PlanCommands::Show { plan_id } => cmd_show(pool, &plan_id).await,
        PlanCommands::List { user } => cmd_list(pool, &user).await,
    }
}

// -----------------------------------------------------------------------
// baba plan generate
// -----------------------------------------------------------------------

/// Line-based progress printer for the interactive surface.
struct PrintSink;

impl ProgressSink for PrintSink {
    fn slot_started(&self, p: &SlotProgress) {
        if p.day_label.is_empty() {
            println!(
                "  [{}/{}] {}: {}",
                p.running_index,
                p.total,
                p.slot_label.label(),
                p.recipe_name
            );
        } else {
            println!(
                "  [{}/{}] {} {}: {}",
                p.running_index,
                p.total,
                p.day_label,
                p.slot_label.label(),
                p.recipe_name
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_generate(
    pool: &PgPool,
    ai: &dyn RecipeAi,
    user: &str,
    prompt: &str,
    plan_type: &str,
    variety: &str,
    slots: &str,
    ingredients: Option<String>,
    calories: Option<i32>,
    shopping_list: bool,
    reuse_last_week: bool,
) -> Result<()> {
    let mut request = PlanRequest::new(user, PlanSource::Chat);
    request.meal_plan_prompt = prompt.to_string();
    request.plan_type = plan_type
        .parse::<PlanType>()
        .with_context(|| format!("invalid plan type: {plan_type:?}"))?;
    request.variety = variety
        .parse::<Variety>()
        .with_context(|| format!("invalid variety policy: {variety:?}"))?;
    request.slots = parse_slots(slots)?;
    request.ingredients_on_hand = ingredients;
    request.calorie_target = calories;
    request.include_shopping_list = shopping_list;
    request.reuse_last_week = reuse_last_week;

    // Merge stored defaults once, at the boundary.
    if let Some(stored) = pref_queries::get_preferences(pool, user).await? {
        request::apply_stored_defaults(&mut request, &stored);
    }

    println!("Generating plan for {user}...");
    let sink = PrintSink;
    let output = run_pipeline(pool, ai, Some(&sink), &request, &PipelineConfig::default()).await?;

    println!();
    println!("{}", output.plain_text_plan);
    println!("Plan ID: {}", output.plan_id);

    Ok(())
}

/// Parse a comma-separated slot list. Empty input means "use the default
/// set" (the pipeline normalizes it).
fn parse_slots(input: &str) -> Result<Vec<TimeSlot>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<TimeSlot>()
                .with_context(|| format!("invalid time slot: {s:?}"))
        })
        .collect()
}

// -----------------------------------------------------------------------
// baba plan show <plan-id>
// -----------------------------------------------------------------------

async fn cmd_show(pool: &PgPool, plan_id_str: &str) -> Result<()> {
    let plan_id: Uuid = plan_id_str
        .parse()
        .with_context(|| format!("invalid plan ID: {plan_id_str:?}"))?;

    let plan = plan_queries::get_plan(pool, plan_id)
        .await?
        .with_context(|| format!("plan {plan_id} not found"))?;

    println!("Plan {}", plan.id);
    println!("  User:    {}", plan.user_id);
    println!("  Type:    {}", plan.plan_type);
    println!("  Variety: {}", plan.variety);
    println!("  Source:  {}", plan.source);
    println!("  Created: {}", plan.created_at.format("%Y-%m-%d %H:%M"));
    println!();
    println!("{}", assemble::render_plain(&PlanDraft::from_plan(&plan)));

    Ok(())
}

// -----------------------------------------------------------------------
// baba plan list --user
// -----------------------------------------------------------------------

async fn cmd_list(pool: &PgPool, user: &str) -> Result<()> {
    let plans = plan_queries::list_plans_for_user(pool, user).await?;

    if plans.is_empty() {
        println!("No plans found for {user}. Use `baba plan generate` to create one.");
        return Ok(());
    }

    // ID is always 36 chars (UUID). Type max is 6, variety max is 16.
    let id_w = 36;
    let type_w = 6;
    let variety_w = 16;
    let source_w = 9;

    println!(
        "{:<id_w$}  {:<type_w$}  {:<variety_w$}  {:<source_w$}  CREATED",
        "ID", "TYPE", "VARIETY", "SOURCE",
    );

    for plan in &plans {
        let created = plan.created_at.format("%Y-%m-%d %H:%M");
        println!(
            "{:<id_w$}  {:<type_w$}  {:<variety_w$}  {:<source_w$}  {}",
            plan.id,
            plan.plan_type.to_string(),
            plan.variety.to_string(),
            plan.source.to_string(),
            created,
        );
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_slots_empty_is_empty() {
        assert!(parse_slots("").unwrap().is_empty());
        assert!(parse_slots("  ").unwrap().is_empty());
    }

    #[test]
    fn parse_slots_splits_and_trims() {
        let slots = parse_slots("breakfast, dinner ,snack").unwrap();
        assert_eq!(
            slots,
            vec![TimeSlot::Breakfast, TimeSlot::Dinner, TimeSlot::Snack]
        );
    }

    #[test]
    fn parse_slots_rejects_unknown() {
        let result = parse_slots("breakfast,brunch");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("brunch"));
    }
}
