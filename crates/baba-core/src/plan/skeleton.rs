//! Tolerant parsing and normalization of plan skeletons.
//!
//! The skeleton generator's response is text that *should* be JSON in the
//! requested shape, but is never trusted: code fences are stripped, unknown
//! time slots are dropped, and a response that fails to parse degrades the
//! plan instead of failing the request.

use baba_db::models::{PlanType, TimeSlot, Variety};
use serde::Deserialize;

/// Canonical Monday-start day labels. A deliberate naming convention, not a
/// binding to real calendar weekdays.
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One outlined meal: a name and a one-line description, no full recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSkeleton {
    pub time_slot: TimeSlot,
    pub recipe_name: String,
    pub description: String,
}

/// One outlined day of a weekly skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySkeleton {
    pub day: i32,
    pub day_name: String,
    pub slots: Vec<SlotSkeleton>,
}

/// The parsed skeleton, or the raw text when parsing failed.
#[derive(Debug, Clone)]
pub enum Skeleton {
    Weekly {
        baba_tip: String,
        days: Vec<DaySkeleton>,
    },
    Daily {
        baba_tip: String,
        slots: Vec<SlotSkeleton>,
    },
    /// The response did not parse into the expected shape. The raw text is
    /// preserved so the persisted plan can carry it as its note.
    Degraded { raw: String },
}

// ---------------------------------------------------------------------------
// Raw serde shapes (never exposed; every field optional)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSkeleton {
    #[serde(default)]
    baba_tip: Option<String>,
    #[serde(default)]
    days: Option<Vec<RawDay>>,
    #[serde(default)]
    slots: Option<Vec<RawSlot>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDay {
    #[serde(default)]
    slots: Vec<RawSlot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSlot {
    #[serde(default)]
    time_slot: String,
    #[serde(default)]
    recipe_name: String,
    #[serde(default)]
    description: String,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a skeleton response. Never fails: anything that does not match the
/// expected shape comes back as [`Skeleton::Degraded`] carrying the raw
/// text.
pub fn parse_skeleton(raw: &str, plan_type: PlanType) -> Skeleton {
    let stripped = strip_code_fences(raw);

    let parsed: RawSkeleton = match serde_json::from_str(stripped) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "skeleton response is not valid JSON, degrading plan");
            return Skeleton::Degraded {
                raw: raw.trim().to_string(),
            };
        }
    };

    let baba_tip = parsed.baba_tip.unwrap_or_default();

    match plan_type {
        PlanType::Weekly => match parsed.days {
            Some(days) => Skeleton::Weekly {
                baba_tip,
                days: days
                    .into_iter()
                    .map(|d| DaySkeleton {
                        day: 0,
                        day_name: String::new(),
                        slots: convert_slots(d.slots),
                    })
                    .collect(),
            },
            None => {
                tracing::warn!("weekly skeleton response has no days, degrading plan");
                Skeleton::Degraded {
                    raw: raw.trim().to_string(),
                }
            }
        },
        PlanType::Daily => match parsed.slots {
            Some(slots) => Skeleton::Daily {
                baba_tip,
                slots: convert_slots(slots),
            },
            None => {
                tracing::warn!("daily skeleton response has no slots, degrading plan");
                Skeleton::Degraded {
                    raw: raw.trim().to_string(),
                }
            }
        },
    }
}

/// Convert raw slots, dropping entries whose time slot is unrecognized or
/// whose name is empty.
fn convert_slots(raw: Vec<RawSlot>) -> Vec<SlotSkeleton> {
    raw.into_iter()
        .filter_map(|s| {
            let time_slot: TimeSlot = match s.time_slot.trim().to_lowercase().parse() {
                Ok(slot) => slot,
                Err(_) => {
                    tracing::warn!(time_slot = %s.time_slot, "dropping slot with unknown time slot");
                    return None;
                }
            };
            if s.recipe_name.trim().is_empty() {
                tracing::warn!(%time_slot, "dropping slot with empty recipe name");
                return None;
            }
            Some(SlotSkeleton {
                time_slot,
                recipe_name: s.recipe_name.trim().to_string(),
                description: s.description.trim().to_string(),
            })
        })
        .collect()
}

/// Strip a surrounding Markdown code fence (```json ... ``` or ``` ... ```)
/// if present. Generators are told not to fence, but some do anyway.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ---------------------------------------------------------------------------
// Normalization and filtering
// ---------------------------------------------------------------------------

/// Normalize a weekly skeleton's day list.
///
/// For `same_every_day` the first returned day is the template, duplicated
/// across all 7 canonical labels (extra days are ignored). Otherwise days
/// beyond 7 are truncated and short lists are kept as-is (renumbered 1..N) --
/// never padded with invented meals.
pub fn normalize_weekly(mut days: Vec<DaySkeleton>, variety: Variety) -> Vec<DaySkeleton> {
    if variety == Variety::SameEveryDay {
        let Some(template) = days.into_iter().next() else {
            return Vec::new();
        };
        return DAY_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| DaySkeleton {
                day: (i + 1) as i32,
                day_name: (*name).to_string(),
                slots: template.slots.clone(),
            })
            .collect();
    }

    if days.len() > 7 {
        tracing::warn!(returned = days.len(), "skeleton returned extra days, truncating to 7");
        days.truncate(7);
    } else if days.len() < 7 {
        tracing::warn!(
            returned = days.len(),
            "skeleton returned fewer than 7 days, keeping short week"
        );
    }

    for (i, day) in days.iter_mut().enumerate() {
        day.day = (i + 1) as i32;
        day.day_name = DAY_NAMES[i].to_string();
    }
    days
}

/// Drop every slot whose time slot is outside the requested set. Days are
/// kept even if filtering empties them; only the reuse branch drops empty
/// days.
pub fn filter_days(days: Vec<DaySkeleton>, requested: &[TimeSlot]) -> Vec<DaySkeleton> {
    days.into_iter()
        .map(|mut day| {
            day.slots = filter_slots(day.slots, requested);
            day
        })
        .collect()
}

/// Drop every slot whose time slot is outside the requested set.
pub fn filter_slots(slots: Vec<SlotSkeleton>, requested: &[TimeSlot]) -> Vec<SlotSkeleton> {
    slots
        .into_iter()
        .filter(|s| requested.contains(&s.time_slot))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly_json(day_count: usize) -> String {
        let days: Vec<String> = (0..day_count)
            .map(|i| {
                format!(
                    r#"{{"day": {}, "dayName": "Day {}", "slots": [
                        {{"timeSlot": "dinner", "recipeName": "Dinner {}", "description": "A dinner."}}
                    ]}}"#,
                    i + 1,
                    i + 1,
                    i + 1,
                )
            })
            .collect();
        format!(
            r#"{{"babaTip": "Salt your pasta water.", "days": [{}]}}"#,
            days.join(",")
        )
    }

    #[test]
    fn parses_weekly_skeleton() {
        let skeleton = parse_skeleton(&weekly_json(7), PlanType::Weekly);
        let Skeleton::Weekly { baba_tip, days } = skeleton else {
            panic!("expected weekly skeleton");
        };
        assert_eq!(baba_tip, "Salt your pasta water.");
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].slots[0].recipe_name, "Dinner 1");
    }

    #[test]
    fn parses_daily_skeleton() {
        let raw = r#"{"babaTip": "Taste as you go.", "slots": [
            {"timeSlot": "breakfast", "recipeName": "Shakshuka", "description": "Eggs in tomato sauce."}
        ]}"#;
        let skeleton = parse_skeleton(raw, PlanType::Daily);
        let Skeleton::Daily { baba_tip, slots } = skeleton else {
            panic!("expected daily skeleton");
        };
        assert_eq!(baba_tip, "Taste as you go.");
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].time_slot, TimeSlot::Breakfast);
    }

    #[test]
    fn non_json_degrades() {
        let raw = "Here is a lovely meal plan for you!\nMonday: pasta...";
        let skeleton = parse_skeleton(raw, PlanType::Weekly);
        let Skeleton::Degraded { raw: kept } = skeleton else {
            panic!("expected degraded skeleton");
        };
        assert!(kept.contains("lovely meal plan"));
    }

    #[test]
    fn weekly_response_without_days_degrades() {
        let raw = r#"{"babaTip": "A tip.", "slots": []}"#;
        assert!(matches!(
            parse_skeleton(raw, PlanType::Weekly),
            Skeleton::Degraded { .. }
        ));
    }

    #[test]
    fn daily_response_without_slots_degrades() {
        let raw = r#"{"babaTip": "A tip.", "days": []}"#;
        assert!(matches!(
            parse_skeleton(raw, PlanType::Daily),
            Skeleton::Degraded { .. }
        ));
    }

    #[test]
    fn code_fences_are_stripped() {
        let fenced = format!("```json\n{}\n```", weekly_json(2));
        let skeleton = parse_skeleton(&fenced, PlanType::Weekly);
        assert!(matches!(skeleton, Skeleton::Weekly { .. }));
    }

    #[test]
    fn unknown_time_slots_are_dropped() {
        let raw = r#"{"babaTip": "", "slots": [
            {"timeSlot": "brunch", "recipeName": "Pancakes", "description": "Fluffy."},
            {"timeSlot": "lunch", "recipeName": "Soup", "description": "Warm."}
        ]}"#;
        let Skeleton::Daily { slots, .. } = parse_skeleton(raw, PlanType::Daily) else {
            panic!("expected daily skeleton");
        };
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].recipe_name, "Soup");
    }

    #[test]
    fn empty_recipe_names_are_dropped() {
        let raw = r#"{"babaTip": "", "slots": [
            {"timeSlot": "dinner", "recipeName": "  ", "description": "Mystery."}
        ]}"#;
        let Skeleton::Daily { slots, .. } = parse_skeleton(raw, PlanType::Daily) else {
            panic!("expected daily skeleton");
        };
        assert!(slots.is_empty());
    }

    // -- normalize_weekly tests --

    fn day(name: &str, recipe: &str) -> DaySkeleton {
        DaySkeleton {
            day: 0,
            day_name: name.to_string(),
            slots: vec![SlotSkeleton {
                time_slot: TimeSlot::Dinner,
                recipe_name: recipe.to_string(),
                description: format!("{recipe} description"),
            }],
        }
    }

    #[test]
    fn normalize_renumbers_with_canonical_labels() {
        let days = vec![day("Funday", "A"), day("Blursday", "B")];
        let normalized = normalize_weekly(days, Variety::Varied);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].day, 1);
        assert_eq!(normalized[0].day_name, "Monday");
        assert_eq!(normalized[1].day, 2);
        assert_eq!(normalized[1].day_name, "Tuesday");
    }

    #[test]
    fn normalize_truncates_excess_days() {
        let days: Vec<DaySkeleton> = (0..9).map(|i| day("X", &format!("R{i}"))).collect();
        let normalized = normalize_weekly(days, Variety::Varied);
        assert_eq!(normalized.len(), 7);
        assert_eq!(normalized[6].day_name, "Sunday");
        assert_eq!(normalized[6].slots[0].recipe_name, "R6");
    }

    #[test]
    fn normalize_keeps_short_weeks_unpadded() {
        let days = vec![day("X", "A"), day("Y", "B"), day("Z", "C")];
        let normalized = normalize_weekly(days, Variety::Varied);
        assert_eq!(normalized.len(), 3);
    }

    #[test]
    fn same_every_day_duplicates_template_across_week() {
        let days = vec![day("Template", "Repeat Me"), day("Ignored", "Never")];
        let normalized = normalize_weekly(days, Variety::SameEveryDay);
        assert_eq!(normalized.len(), 7);
        for (i, d) in normalized.iter().enumerate() {
            assert_eq!(d.day, (i + 1) as i32);
            assert_eq!(d.day_name, DAY_NAMES[i]);
            assert_eq!(d.slots[0].recipe_name, "Repeat Me");
        }
    }

    #[test]
    fn same_every_day_with_no_days_yields_empty() {
        let normalized = normalize_weekly(vec![], Variety::SameEveryDay);
        assert!(normalized.is_empty());
    }

    // -- filtering tests --

    #[test]
    fn filter_slots_respects_requested_set() {
        let slots = vec![
            SlotSkeleton {
                time_slot: TimeSlot::Breakfast,
                recipe_name: "Oats".to_string(),
                description: "Oats.".to_string(),
            },
            SlotSkeleton {
                time_slot: TimeSlot::Snack,
                recipe_name: "Apple".to_string(),
                description: "An apple.".to_string(),
            },
        ];
        let filtered = filter_slots(slots, &[TimeSlot::Breakfast, TimeSlot::Lunch]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].recipe_name, "Oats");
    }

    #[test]
    fn filter_days_keeps_emptied_days() {
        let days = vec![day("X", "A")];
        let filtered = filter_days(days, &[TimeSlot::Breakfast]);
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].slots.is_empty());
    }
}
