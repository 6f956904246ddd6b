//! Caller-facing request types, preference resolution, and input validation.
//!
//! All three invoking surfaces build a [`PlanRequest`], merge stored
//! per-user defaults into it once at the boundary, normalize it, and pass it
//! by value into the orchestrator. Nothing downstream re-fetches
//! preferences.

use baba_db::models::{PlanSource, PlanType, TimeSlot, UserPreferences, Variety};
use thiserror::Error;

/// Prompt used when the caller supplied no free-text request (e.g. the
/// scheduled job running purely off stored defaults).
pub const DEFAULT_PROMPT: &str = "A balanced meal plan with simple, home-cooked meals.";

/// A fully specified plan request, one per pipeline invocation.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub user_id: String,
    /// Free-text preference statement (diet, cuisine, time budget, ...).
    pub meal_plan_prompt: String,
    pub ingredients_on_hand: Option<String>,
    pub calorie_target: Option<i32>,
    pub dietary_preferences: Vec<String>,
    pub preferred_cooking_oil: Option<String>,
    pub plan_type: PlanType,
    pub include_shopping_list: bool,
    pub variety: Variety,
    /// Requested slot set. Empty means "use the default set" (normalized
    /// away before the pipeline runs).
    pub slots: Vec<TimeSlot>,
    pub reuse_last_week: bool,
    pub source: PlanSource,
}

impl PlanRequest {
    /// A weekly varied request with no preferences set. Surfaces start here
    /// and fill in what the caller provided.
    pub fn new(user_id: impl Into<String>, source: PlanSource) -> Self {
        Self {
            user_id: user_id.into(),
            meal_plan_prompt: String::new(),
            ingredients_on_hand: None,
            calorie_target: None,
            dietary_preferences: Vec::new(),
            preferred_cooking_oil: None,
            plan_type: PlanType::Weekly,
            include_shopping_list: false,
            variety: Variety::Varied,
            slots: Vec::new(),
            reuse_last_week: false,
            source,
        }
    }
}

/// Merge stored per-user defaults into a caller request.
///
/// Caller-supplied values always win; stored defaults only fill gaps.
pub fn apply_stored_defaults(request: &mut PlanRequest, stored: &UserPreferences) {
    if request.dietary_preferences.is_empty() {
        request.dietary_preferences = stored.dietary_preferences.clone();
    }
    if request.preferred_cooking_oil.is_none() {
        request.preferred_cooking_oil = stored.preferred_cooking_oil.clone();
    }
    if request.calorie_target.is_none() {
        request.calorie_target = stored.calorie_target;
    }
}

/// Normalize a request in place:
/// - an empty slot set becomes {breakfast, lunch, dinner};
/// - the slot set is deduplicated and put in canonical order;
/// - `same_every_week` resolves into the reuse branch;
/// - an empty prompt becomes [`DEFAULT_PROMPT`].
pub fn normalize(request: &mut PlanRequest) {
    if request.slots.is_empty() {
        request.slots = vec![TimeSlot::Breakfast, TimeSlot::Lunch, TimeSlot::Dinner];
    }
    request.slots.sort();
    request.slots.dedup();

    // "Same as every week" is exactly the reuse-prior-plan behavior.
    if request.variety == Variety::SameEveryWeek {
        request.reuse_last_week = true;
    }

    if request.meal_plan_prompt.trim().is_empty() {
        request.meal_plan_prompt = DEFAULT_PROMPT.to_string();
    }
}

/// Validation errors reported before any upstream call is made.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("calorie target must be positive, got {0}")]
    NonPositiveCalorieTarget(i32),

    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("requested slot set is empty")]
    EmptySlotSet,
}

/// Validate a (normalized) request.
pub fn validate(request: &PlanRequest) -> Result<(), RequestError> {
    if request.user_id.trim().is_empty() {
        return Err(RequestError::EmptyUserId);
    }
    if let Some(target) = request.calorie_target {
        if target <= 0 {
            return Err(RequestError::NonPositiveCalorieTarget(target));
        }
    }
    if request.slots.is_empty() {
        return Err(RequestError::EmptySlotSet);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Preference context
// ---------------------------------------------------------------------------

/// Free-text context derived from a resolved request, handed to the
/// skeleton generator.
#[derive(Debug, Clone)]
pub struct PreferenceContext {
    pub summary: String,
    pub ingredients_on_hand: Option<String>,
    pub calorie_context: Option<String>,
}

/// Build the preference context for a resolved request.
pub fn preference_context(request: &PlanRequest) -> PreferenceContext {
    let mut summary = request.meal_plan_prompt.trim().to_string();

    if !request.dietary_preferences.is_empty() {
        summary.push_str(&format!(
            " Dietary preferences: {}.",
            request.dietary_preferences.join(", ")
        ));
    }
    if let Some(ref oil) = request.preferred_cooking_oil {
        summary.push_str(&format!(" Preferred cooking oil: {oil}."));
    }

    PreferenceContext {
        summary,
        ingredients_on_hand: request.ingredients_on_hand.clone(),
        calorie_context: request
            .calorie_target
            .map(|t| format!("Aim for roughly {t} calories per day.")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn stored_prefs() -> UserPreferences {
        UserPreferences {
            user_id: "user-1".to_string(),
            dietary_preferences: vec!["vegan".to_string()],
            preferred_cooking_oil: Some("olive oil".to_string()),
            calorie_target: Some(1800),
            auto_plan: false,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn stored_defaults_fill_gaps() {
        let mut req = PlanRequest::new("user-1", PlanSource::Chat);
        apply_stored_defaults(&mut req, &stored_prefs());

        assert_eq!(req.dietary_preferences, vec!["vegan".to_string()]);
        assert_eq!(req.preferred_cooking_oil.as_deref(), Some("olive oil"));
        assert_eq!(req.calorie_target, Some(1800));
    }

    #[test]
    fn caller_values_win_over_stored_defaults() {
        let mut req = PlanRequest::new("user-1", PlanSource::Chat);
        req.dietary_preferences = vec!["pescatarian".to_string()];
        req.calorie_target = Some(2400);
        apply_stored_defaults(&mut req, &stored_prefs());

        assert_eq!(req.dietary_preferences, vec!["pescatarian".to_string()]);
        assert_eq!(req.calorie_target, Some(2400));
        // Unset field still picks up the stored value.
        assert_eq!(req.preferred_cooking_oil.as_deref(), Some("olive oil"));
    }

    #[test]
    fn normalize_defaults_empty_slot_set() {
        let mut req = PlanRequest::new("user-1", PlanSource::Chat);
        normalize(&mut req);
        assert_eq!(
            req.slots,
            vec![TimeSlot::Breakfast, TimeSlot::Lunch, TimeSlot::Dinner]
        );
    }

    #[test]
    fn normalize_dedups_and_orders_slots() {
        let mut req = PlanRequest::new("user-1", PlanSource::Chat);
        req.slots = vec![
            TimeSlot::Snack,
            TimeSlot::Dinner,
            TimeSlot::Snack,
            TimeSlot::Breakfast,
        ];
        normalize(&mut req);
        assert_eq!(
            req.slots,
            vec![TimeSlot::Breakfast, TimeSlot::Dinner, TimeSlot::Snack]
        );
    }

    #[test]
    fn normalize_resolves_same_every_week_to_reuse() {
        let mut req = PlanRequest::new("user-1", PlanSource::Chat);
        req.variety = Variety::SameEveryWeek;
        assert!(!req.reuse_last_week);
        normalize(&mut req);
        assert!(req.reuse_last_week);
    }

    #[test]
    fn normalize_fills_default_prompt() {
        let mut req = PlanRequest::new("user-1", PlanSource::Scheduled);
        req.meal_plan_prompt = "   ".to_string();
        normalize(&mut req);
        assert_eq!(req.meal_plan_prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn validate_rejects_non_positive_calories() {
        let mut req = PlanRequest::new("user-1", PlanSource::Api);
        normalize(&mut req);
        req.calorie_target = Some(0);
        assert!(matches!(
            validate(&req),
            Err(RequestError::NonPositiveCalorieTarget(0))
        ));

        req.calorie_target = Some(-100);
        assert!(validate(&req).is_err());
    }

    #[test]
    fn validate_rejects_empty_user() {
        let mut req = PlanRequest::new("  ", PlanSource::Api);
        normalize(&mut req);
        assert!(matches!(validate(&req), Err(RequestError::EmptyUserId)));
    }

    #[test]
    fn validate_accepts_normalized_request() {
        let mut req = PlanRequest::new("user-1", PlanSource::Chat);
        req.calorie_target = Some(2000);
        normalize(&mut req);
        assert!(validate(&req).is_ok());
    }

    #[test]
    fn preference_context_includes_diet_and_oil() {
        let mut req = PlanRequest::new("user-1", PlanSource::Chat);
        req.meal_plan_prompt = "vegetarian, under 30 minutes".to_string();
        req.dietary_preferences = vec!["vegetarian".to_string(), "nut-free".to_string()];
        req.preferred_cooking_oil = Some("avocado oil".to_string());
        req.calorie_target = Some(2000);
        req.ingredients_on_hand = Some("rice, chickpeas".to_string());

        let ctx = preference_context(&req);
        assert!(ctx.summary.starts_with("vegetarian, under 30 minutes"));
        assert!(ctx.summary.contains("vegetarian, nut-free"));
        assert!(ctx.summary.contains("avocado oil"));
        assert_eq!(ctx.ingredients_on_hand.as_deref(), Some("rice, chickpeas"));
        assert_eq!(
            ctx.calorie_context.as_deref(),
            Some("Aim for roughly 2000 calories per day.")
        );
    }

    #[test]
    fn preference_context_omits_absent_fields() {
        let mut req = PlanRequest::new("user-1", PlanSource::Chat);
        req.meal_plan_prompt = "quick dinners".to_string();
        let ctx = preference_context(&req);
        assert_eq!(ctx.summary, "quick dinners");
        assert!(ctx.ingredients_on_hand.is_none());
        assert!(ctx.calorie_context.is_none());
    }
}
