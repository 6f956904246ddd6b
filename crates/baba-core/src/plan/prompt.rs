//! Skeleton instruction construction.
//!
//! Assembles the instruction text sent to the plan skeleton generator: the
//! response schema, outline guidelines, the variety-policy directive, and
//! the requested slot set. This module contains pure logic (no I/O).

use baba_db::models::{PlanType, TimeSlot, Variety};

use crate::ai::SkeletonRequest;
use crate::request::{PlanRequest, PreferenceContext};

/// Response schema for weekly skeletons, included in the instructions.
const WEEKLY_SCHEMA_REFERENCE: &str = r#"## Response Schema

Respond with JSON only -- no prose, no code fences.

```json
{
  "babaTip": "string",          // REQUIRED. One short, practical cooking tip.
  "days": [                      // REQUIRED. One entry per day, Monday first.
    {
      "day": 1,                  // 1..7, Monday-start.
      "dayName": "Monday",
      "slots": [
        {
          "timeSlot": "dinner",  // one of: breakfast, lunch, dinner, snack
          "recipeName": "string",
          "description": "string" // ONE line. No ingredients, no steps.
        }
      ]
    }
  ]
}
```
"#;

/// Response schema for daily skeletons, included in the instructions.
const DAILY_SCHEMA_REFERENCE: &str = r#"## Response Schema

Respond with JSON only -- no prose, no code fences.

```json
{
  "babaTip": "string",          // REQUIRED. One short, practical cooking tip.
  "slots": [
    {
      "timeSlot": "dinner",      // one of: breakfast, lunch, dinner, snack
      "recipeName": "string",
      "description": "string"    // ONE line. No ingredients, no steps.
    }
  ]
}
```
"#;

/// Outline guidelines included in every skeleton instruction.
const OUTLINE_GUIDELINES: &str = r#"## Outline Guidelines

1. **This is an outline, not a cookbook.** Give each meal a name and one
   descriptive line. Full recipes are synthesized later, one by one.
2. **Only use the requested time slots.** Entries for other slots are
   discarded.
3. **Respect the stated preferences.** Diet, cuisine, and time budget in the
   preference context are hard requirements, not suggestions.
4. **Use ingredients on hand first.** When an ingredient list is provided,
   favor meals that consume it.
5. **Keep names concrete.** "Lemon Chickpea Stew" beats "Healthy Dinner".
"#;

/// The variety-policy directive. Policies reshape the outline only through
/// this text; the pipeline does not verify the resulting structure for
/// `leftovers` and `meal_prep_sunday`.
fn variety_instruction(variety: Variety) -> &'static str {
    match variety {
        Variety::Varied => "Make every day different: no recipe should appear twice in the week.",
        Variety::SameEveryDay => {
            "Return exactly ONE day (day 1) as a template. The same meals will \
             be repeated every day of the week, so choose meals that hold up to \
             repetition."
        }
        // Reuse of last week's plan is handled structurally before
        // generation; if generation still runs (no prior plan), fall back to
        // a varied outline.
        Variety::SameEveryWeek => {
            "Make every day different: no recipe should appear twice in the week."
        }
        Variety::Leftovers => {
            "Plan dinners in double portions and make the next day's lunch the \
             previous dinner's leftovers, transformed where it helps (e.g. \
             roast vegetables become a grain bowl)."
        }
        Variety::MealPrepSunday => {
            "Design the week around a single Sunday meal-prep session: a small \
             set of base components prepared once, with dinners repeating or \
             remixing those components through the week."
        }
    }
}

/// Build the full skeleton request for a resolved plan request.
pub fn build_skeleton_request(request: &PlanRequest, ctx: &PreferenceContext) -> SkeletonRequest {
    let mut instructions = String::with_capacity(2048);

    // Role and output contract.
    instructions.push_str("# Meal Plan Outline\n\n");
    match request.plan_type {
        PlanType::Weekly => instructions.push_str(
            "Outline a 7-day meal plan, Monday through Sunday. \
             Every day gets an entry for each requested time slot.\n\n",
        ),
        PlanType::Daily => instructions.push_str(
            "Outline a single day of meals. \
             One entry for each requested time slot.\n\n",
        ),
    }

    instructions.push_str(&format!(
        "Requested time slots: {}.\n\n",
        slot_list(&request.slots)
    ));

    instructions.push_str("Variety: ");
    instructions.push_str(variety_instruction(request.variety));
    instructions.push_str("\n\n");

    // Schema reference.
    match request.plan_type {
        PlanType::Weekly => instructions.push_str(WEEKLY_SCHEMA_REFERENCE),
        PlanType::Daily => instructions.push_str(DAILY_SCHEMA_REFERENCE),
    }
    instructions.push('\n');

    // Outline guidelines.
    instructions.push_str(OUTLINE_GUIDELINES);

    SkeletonRequest {
        instructions,
        preference_context: ctx.summary.clone(),
        ingredients_on_hand: ctx.ingredients_on_hand.clone(),
        calorie_context: ctx.calorie_context.clone(),
    }
}

fn slot_list(slots: &[TimeSlot]) -> String {
    slots
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
