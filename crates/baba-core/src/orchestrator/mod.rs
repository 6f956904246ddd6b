//! The meal-plan pipeline: one sequential, I/O-bound state machine per
//! invocation.
//!
//! Phases run in a fixed order -- `skeleton`, `materialize[i]` (one per
//! slot, day-major then slot-minor), `consolidate`, `assemble`, `persist` --
//! and every external call is a suspension point. There is no worker pool
//! and no cross-invocation shared state: concurrent invocations produce
//! independent plans (and, outside the reuse branch, disjoint recipes).
//!
//! Failure policy: an unparseable skeleton degrades the plan, a failed slot
//! synthesis degrades that slot, a failed consolidation degrades the
//! shopping list; only invalid input and persistence failures are terminal.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use baba_db::models::{DayEntry, MealPlan, PlanType, SlotEntry, TimeSlot};
use baba_db::queries::plans as plan_db;

use crate::ai::RecipeAi;
use crate::plan::assemble::{self, PlanDraft};
use crate::plan::materialize;
use crate::plan::progress::{ProgressSink, SlotProgress};
use crate::plan::prompt;
use crate::plan::shopping;
use crate::plan::skeleton::{self, Skeleton, SlotSkeleton};
use crate::request::{self, PlanRequest};

/// Tunables for one pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Deadline for each slot's synthesis call. A slot that misses it gets
    /// the description fallback.
    pub synthesis_timeout: Duration,
    /// How many prior plans to fetch when looking for last week's plan.
    pub reuse_candidates: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            synthesis_timeout: Duration::from_secs(60),
            reuse_candidates: 10,
        }
    }
}

/// The caller-facing result of a pipeline invocation.
#[derive(Debug, Clone)]
pub struct PlanOutput {
    pub plan_id: Uuid,
    pub plain_text_plan: String,
    pub linked_plan: String,
    pub shopping_list: Option<String>,
}

/// Named pipeline phases, used for structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Skeleton,
    Materialize(usize),
    Consolidate,
    Assemble,
    Persist,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skeleton => f.write_str("skeleton"),
            Self::Materialize(i) => write!(f, "materialize[{i}]"),
            Self::Consolidate => f.write_str("consolidate"),
            Self::Assemble => f.write_str("assemble"),
            Self::Persist => f.write_str("persist"),
        }
    }
}

/// Run the pipeline for one request.
///
/// The request is normalized and validated first; nothing upstream is
/// called for invalid input. Returns the persisted plan id plus both
/// renderings and the shopping list if one was built.
pub async fn run_pipeline(
    pool: &PgPool,
    ai: &dyn RecipeAi,
    progress: Option<&dyn ProgressSink>,
    request: &PlanRequest,
    config: &PipelineConfig,
) -> Result<PlanOutput> {
    let mut request = request.clone();
    request::normalize(&mut request);
    request::validate(&request)?;

    // Reuse branch: clone and filter the most recent prior weekly plan,
    // writing no new recipes. A missing prior plan is not an error -- fall
    // through to normal generation.
    if request.reuse_last_week && request.plan_type == PlanType::Weekly {
        let candidates = plan_db::recent_plans_for_user(
            pool,
            &request.user_id,
            PlanType::Weekly,
            config.reuse_candidates,
        )
        .await?;

        match most_recent_plan(candidates) {
            Some(prior) => return reuse_prior_plan(pool, &request, &prior).await,
            None => {
                tracing::info!(
                    user_id = %request.user_id,
                    "no prior weekly plan to reuse, generating fresh"
                );
            }
        }
    }

    // Skeleton phase.
    tracing::debug!(phase = %Phase::Skeleton, user_id = %request.user_id, "generating plan skeleton");
    let ctx = request::preference_context(&request);
    let skeleton_request = prompt::build_skeleton_request(&request, &ctx);
    let raw = ai
        .plan_skeleton(&skeleton_request)
        .await
        .context("plan skeleton generation failed")?;

    let (baba_tip, days, flat_slots) = match skeleton::parse_skeleton(&raw, request.plan_type) {
        Skeleton::Degraded { raw } => {
            return persist_degraded(pool, &request, raw).await;
        }
        Skeleton::Weekly { baba_tip, days } => {
            let days = skeleton::normalize_weekly(days, request.variety);
            let days = skeleton::filter_days(days, &request.slots);
            (baba_tip, days, Vec::new())
        }
        Skeleton::Daily { baba_tip, slots } => {
            let slots = skeleton::filter_slots(slots, &request.slots);
            (baba_tip, Vec::new(), slots)
        }
    };

    // The filtered slot list is final here, so every progress event carries
    // the true total.
    let total = days.iter().map(|d| d.slots.len()).sum::<usize>() + flat_slots.len();
    let mut running_index = 0usize;
    let mut completed_days = 0usize;
    let mut ingredients: Vec<String> = Vec::new();

    // Materialize loop: day-major, slot-minor, strictly one at a time.
    let mut day_entries: Vec<DayEntry> = Vec::with_capacity(days.len());
    for day in &days {
        let mut entries: Vec<SlotEntry> = Vec::with_capacity(day.slots.len());
        for slot in &day.slots {
            running_index += 1;
            emit(progress, &day.day_name, slot, running_index, total, completed_days);
            tracing::debug!(
                phase = %Phase::Materialize(running_index),
                recipe_name = %slot.recipe_name,
                day = %day.day_name,
                "materializing slot"
            );
            let outcome =
                materialize::materialize_slot(pool, ai, slot, config.synthesis_timeout).await?;
            ingredients.extend_from_slice(&outcome.ingredients);
            entries.push(outcome.entry);
        }
        completed_days += 1;
        day_entries.push(DayEntry {
            day: day.day,
            day_name: day.day_name.clone(),
            slots: entries,
        });
    }

    let mut slot_entries: Vec<SlotEntry> = Vec::with_capacity(flat_slots.len());
    for slot in &flat_slots {
        running_index += 1;
        emit(progress, "", slot, running_index, total, completed_days);
        tracing::debug!(
            phase = %Phase::Materialize(running_index),
            recipe_name = %slot.recipe_name,
            "materializing slot"
        );
        let outcome =
            materialize::materialize_slot(pool, ai, slot, config.synthesis_timeout).await?;
        ingredients.extend_from_slice(&outcome.ingredients);
        slot_entries.push(outcome.entry);
    }

    // Consolidate phase: only when requested and something was collected.
    let shopping_list = if request.include_shopping_list && !ingredients.is_empty() {
        tracing::debug!(phase = %Phase::Consolidate, items = ingredients.len(), "consolidating shopping list");
        Some(shopping::consolidate_ingredients(ai, &ingredients).await?)
    } else {
        None
    };

    let draft = PlanDraft {
        user_id: request.user_id.clone(),
        plan_type: request.plan_type,
        variety: request.variety,
        days: day_entries,
        slots: slot_entries,
        baba_tip,
        shopping_list,
        source: request.source,
    };
    persist_and_render(pool, draft).await
}

/// Select the most recent plan from an UNORDERED candidate list.
///
/// The plan store gives no ordering guarantee on reads, so recency is
/// decided here, explicitly, by creation timestamp.
pub fn most_recent_plan(plans: Vec<MealPlan>) -> Option<MealPlan> {
    plans.into_iter().max_by_key(|p| p.created_at)
}

/// Clone a prior plan's day structure, keeping only the requested slots and
/// dropping any day left empty by the filtering.
fn clone_filtered_days(days: &[DayEntry], requested: &[TimeSlot]) -> Vec<DayEntry> {
    days.iter()
        .filter_map(|day| {
            let slots: Vec<SlotEntry> = day
                .slots
                .iter()
                .filter(|s| requested.contains(&s.time_slot))
                .cloned()
                .collect();
            if slots.is_empty() {
                return None;
            }
            Some(DayEntry {
                day: day.day,
                day_name: day.day_name.clone(),
                slots,
            })
        })
        .collect()
}

/// The reuse branch: persist a new plan referencing the prior plan's
/// existing recipe ids. Zero recipe writes, no shopping list (nothing was
/// materialized, so no ingredients were collected).
async fn reuse_prior_plan(
    pool: &PgPool,
    request: &PlanRequest,
    prior: &MealPlan,
) -> Result<PlanOutput> {
    tracing::info!(
        prior_plan_id = %prior.id,
        user_id = %request.user_id,
        "reusing most recent weekly plan"
    );

    let draft = PlanDraft {
        user_id: request.user_id.clone(),
        plan_type: PlanType::Weekly,
        variety: request.variety,
        days: clone_filtered_days(&prior.days.0, &request.slots),
        slots: Vec::new(),
        baba_tip: prior.baba_tip.clone(),
        shopping_list: None,
        source: request.source,
    };
    persist_and_render(pool, draft).await
}

/// Persist a degraded plan after an unparseable skeleton: the raw response
/// becomes the plan note, and there are no slots, recipes, or shopping
/// list. The caller still gets a usable (if empty) result.
async fn persist_degraded(pool: &PgPool, request: &PlanRequest, raw: String) -> Result<PlanOutput> {
    tracing::warn!(
        user_id = %request.user_id,
        "persisting degraded plan from unparseable skeleton"
    );

    let draft = PlanDraft {
        user_id: request.user_id.clone(),
        plan_type: request.plan_type,
        variety: request.variety,
        days: Vec::new(),
        slots: Vec::new(),
        baba_tip: raw,
        shopping_list: None,
        source: request.source,
    };
    persist_and_render(pool, draft).await
}

/// Assemble both renderings and write the plan row. A write failure here is
/// terminal for the invocation; recipes already written stay (accepted
/// debris, cleaned up by nothing).
async fn persist_and_render(pool: &PgPool, draft: PlanDraft) -> Result<PlanOutput> {
    tracing::debug!(phase = %Phase::Assemble, "rendering plan");
    let plain_text_plan = assemble::render_plain(&draft);
    let linked_plan = assemble::render_linked(&draft);
    let shopping_list = draft.shopping_list.clone();

    tracing::debug!(phase = %Phase::Persist, "writing plan");
    let plan = plan_db::insert_plan(pool, &draft.into_new_plan())
        .await
        .context("failed to persist meal plan")?;

    tracing::info!(plan_id = %plan.id, user_id = %plan.user_id, "meal plan persisted");

    Ok(PlanOutput {
        plan_id: plan.id,
        plain_text_plan,
        linked_plan,
        shopping_list,
    })
}

fn emit(
    sink: Option<&dyn ProgressSink>,
    day_label: &str,
    slot: &SlotSkeleton,
    running_index: usize,
    total: usize,
    completed_days: usize,
) {
    if let Some(sink) = sink {
        sink.slot_started(&SlotProgress {
            day_label: day_label.to_string(),
            slot_label: slot.time_slot,
            recipe_name: slot.recipe_name.clone(),
            running_index,
            total,
            completed_days,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sqlx::types::Json;
    use baba_db::models::{PlanSource, Variety};

    use super::*;

    fn plan_created_at(hour: u32) -> MealPlan {
        MealPlan {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            plan_type: PlanType::Weekly,
            variety: Variety::Varied,
            days: Json(vec![]),
            slots: Json(vec![]),
            baba_tip: String::new(),
            shopping_list: None,
            source: PlanSource::Chat,
            created_at: Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn most_recent_plan_sorts_unordered_candidates() {
        let early = plan_created_at(8);
        let late = plan_created_at(20);
        let middle = plan_created_at(12);
        let late_id = late.id;

        // Deliberately out of order, as the store may return them.
        let picked = most_recent_plan(vec![early, late, middle]).expect("should pick one");
        assert_eq!(picked.id, late_id);
    }

    #[test]
    fn most_recent_plan_empty_is_none() {
        assert!(most_recent_plan(vec![]).is_none());
    }

    fn day_with_slots(day: i32, slots: &[TimeSlot]) -> DayEntry {
        DayEntry {
            day,
            day_name: skeleton::DAY_NAMES[(day - 1) as usize].to_string(),
            slots: slots
                .iter()
                .map(|&time_slot| SlotEntry {
                    time_slot,
                    recipe_name: format!("{time_slot} meal"),
                    description: String::new(),
                    recipe_id: Uuid::new_v4(),
                })
                .collect(),
        }
    }

    #[test]
    fn clone_filtered_days_keeps_requested_slots_only() {
        let days = vec![
            day_with_slots(1, &[TimeSlot::Breakfast, TimeSlot::Dinner]),
            day_with_slots(2, &[TimeSlot::Breakfast]),
        ];
        let filtered = clone_filtered_days(&days, &[TimeSlot::Dinner]);

        // Day 2 had no dinner, so it is dropped entirely.
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].day, 1);
        assert_eq!(filtered[0].slots.len(), 1);
        assert_eq!(filtered[0].slots[0].time_slot, TimeSlot::Dinner);
    }

    #[test]
    fn clone_filtered_days_preserves_recipe_ids() {
        let days = vec![day_with_slots(1, &[TimeSlot::Dinner])];
        let original_id = days[0].slots[0].recipe_id;
        let filtered = clone_filtered_days(&days, &[TimeSlot::Dinner]);
        assert_eq!(filtered[0].slots[0].recipe_id, original_id);
    }

    #[test]
    fn phase_display_names() {
        assert_eq!(Phase::Skeleton.to_string(), "skeleton");
        assert_eq!(Phase::Materialize(3).to_string(), "materialize[3]");
        assert_eq!(Phase::Consolidate.to_string(), "consolidate");
        assert_eq!(Phase::Assemble.to_string(), "assemble");
        assert_eq!(Phase::Persist.to_string(), "persist");
    }
}
