//! Plan assembly: the persisted draft and the two human-facing renderings.
//!
//! Both renderings come from the same draft: a plain-text version for email
//! and notification use, and a link-annotated version for interactive
//! surfaces that references each recipe by id (`/recipes/{id}`).

use baba_db::models::{DayEntry, MealPlan, PlanSource, PlanType, SlotEntry, Variety};
use baba_db::queries::plans::NewMealPlan;

/// The fully assembled plan, ready to persist and render.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    pub user_id: String,
    pub plan_type: PlanType,
    pub variety: Variety,
    pub days: Vec<DayEntry>,
    pub slots: Vec<SlotEntry>,
    pub baba_tip: String,
    pub shopping_list: Option<String>,
    pub source: PlanSource,
}

impl PlanDraft {
    /// Rebuild a draft from a persisted plan, so stored plans can be
    /// re-rendered (e.g. `baba plan show`).
    pub fn from_plan(plan: &MealPlan) -> Self {
        Self {
            user_id: plan.user_id.clone(),
            plan_type: plan.plan_type,
            variety: plan.variety,
            days: plan.days.0.clone(),
            slots: plan.slots.0.clone(),
            baba_tip: plan.baba_tip.clone(),
            shopping_list: plan.shopping_list.clone(),
            source: plan.source,
        }
    }

    /// Convert into the insert parameters for the plan store.
    pub fn into_new_plan(self) -> NewMealPlan {
        NewMealPlan {
            user_id: self.user_id,
            plan_type: self.plan_type,
            variety: self.variety,
            days: self.days,
            slots: self.slots,
            baba_tip: self.baba_tip,
            shopping_list: self.shopping_list,
            source: self.source,
        }
    }
}

/// Render the plain-text version.
pub fn render_plain(draft: &PlanDraft) -> String {
    render(draft, false)
}

/// Render the link-annotated version, referencing each recipe by id.
pub fn render_linked(draft: &PlanDraft) -> String {
    render(draft, true)
}

fn render(draft: &PlanDraft, linked: bool) -> String {
    let mut out = String::new();

    match draft.plan_type {
        PlanType::Weekly => out.push_str("Your weekly meal plan\n"),
        PlanType::Daily => out.push_str("Your meal plan for today\n"),
    }

    if !draft.baba_tip.is_empty() {
        out.push_str(&format!("\nBaba's tip: {}\n", draft.baba_tip));
    }

    for day in &draft.days {
        out.push_str(&format!("\n{}\n", day.day_name));
        for slot in &day.slots {
            out.push_str(&render_slot(slot, linked));
        }
    }

    if !draft.slots.is_empty() {
        out.push('\n');
        for slot in &draft.slots {
            out.push_str(&render_slot(slot, linked));
        }
    }

    if let Some(ref list) = draft.shopping_list {
        out.push_str("\nShopping list:\n");
        out.push_str(list);
        out.push('\n');
    }

    out
}

fn render_slot(slot: &SlotEntry, linked: bool) -> String {
    let name = if linked {
        format!("[{}](/recipes/{})", slot.recipe_name, slot.recipe_id)
    } else {
        slot.recipe_name.clone()
    };
    if slot.description.is_empty() {
        format!("  {}: {}\n", slot.time_slot.label(), name)
    } else {
        format!("  {}: {} -- {}\n", slot.time_slot.label(), name, slot.description)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use baba_db::models::TimeSlot;
    use uuid::Uuid;

    use super::*;

    fn slot(time_slot: TimeSlot, name: &str, id: Uuid) -> SlotEntry {
        SlotEntry {
            time_slot,
            recipe_name: name.to_string(),
            description: format!("{name}, briefly."),
            recipe_id: id,
        }
    }

    fn weekly_draft() -> PlanDraft {
        let id = Uuid::new_v4();
        PlanDraft {
            user_id: "user-1".to_string(),
            plan_type: PlanType::Weekly,
            variety: Variety::Varied,
            days: vec![
                DayEntry {
                    day: 1,
                    day_name: "Monday".to_string(),
                    slots: vec![slot(TimeSlot::Dinner, "Lentil Curry", id)],
                },
                DayEntry {
                    day: 2,
                    day_name: "Tuesday".to_string(),
                    slots: vec![slot(TimeSlot::Dinner, "Minestrone", Uuid::new_v4())],
                },
            ],
            slots: vec![],
            baba_tip: "Toast your spices.".to_string(),
            shopping_list: Some("PANTRY:\n1 cup lentils".to_string()),
            source: PlanSource::Chat,
        }
    }

    #[test]
    fn plain_rendering_has_days_and_tip() {
        let rendered = render_plain(&weekly_draft());
        assert!(rendered.starts_with("Your weekly meal plan"));
        assert!(rendered.contains("Baba's tip: Toast your spices."));
        assert!(rendered.contains("\nMonday\n"));
        assert!(rendered.contains("  Dinner: Lentil Curry -- Lentil Curry, briefly."));
        assert!(rendered.contains("Shopping list:\nPANTRY:\n1 cup lentils"));
        assert!(!rendered.contains("/recipes/"));
    }

    #[test]
    fn linked_rendering_references_recipe_ids() {
        let draft = weekly_draft();
        let id = draft.days[0].slots[0].recipe_id;
        let rendered = render_linked(&draft);
        assert!(rendered.contains(&format!("[Lentil Curry](/recipes/{id})")));
    }

    #[test]
    fn daily_draft_renders_flat_slots() {
        let draft = PlanDraft {
            plan_type: PlanType::Daily,
            days: vec![],
            slots: vec![slot(TimeSlot::Breakfast, "Shakshuka", Uuid::new_v4())],
            shopping_list: None,
            ..weekly_draft()
        };
        let rendered = render_plain(&draft);
        assert!(rendered.starts_with("Your meal plan for today"));
        assert!(rendered.contains("  Breakfast: Shakshuka"));
        assert!(!rendered.contains("Monday"));
        assert!(!rendered.contains("Shopping list"));
    }

    #[test]
    fn degraded_draft_renders_tip_only() {
        let draft = PlanDraft {
            days: vec![],
            slots: vec![],
            shopping_list: None,
            baba_tip: "Here is a lovely meal plan...".to_string(),
            ..weekly_draft()
        };
        let rendered = render_plain(&draft);
        assert!(rendered.contains("Baba's tip: Here is a lovely meal plan..."));
        assert!(!rendered.contains("Dinner"));
    }

    #[test]
    fn into_new_plan_carries_all_fields() {
        let draft = weekly_draft();
        let new_plan = draft.clone().into_new_plan();
        assert_eq!(new_plan.user_id, "user-1");
        assert_eq!(new_plan.plan_type, PlanType::Weekly);
        assert_eq!(new_plan.days.len(), 2);
        assert!(new_plan.slots.is_empty());
        assert_eq!(new_plan.shopping_list.as_deref(), Some("PANTRY:\n1 cup lentils"));
    }
}
