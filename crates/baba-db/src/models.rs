use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Whether a plan covers a single day or a full week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Weekly,
    Daily,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Weekly => "weekly",
            Self::Daily => "daily",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanType {
    type Err = PlanTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "daily" => Ok(Self::Daily),
            other => Err(PlanTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanType`] string.
#[derive(Debug, Clone)]
pub struct PlanTypeParseError(pub String);

impl fmt::Display for PlanTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan type: {:?}", self.0)
    }
}

impl std::error::Error for PlanTypeParseError {}

// ---------------------------------------------------------------------------

/// Variety policy controlling how days and slots are generated, duplicated,
/// or reused across a plan.
///
/// `leftovers` and `meal_prep_sunday` are communicated to the skeleton
/// generator as instruction text only; the resulting structure is not
/// verified (a soft guarantee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Variety {
    Varied,
    SameEveryDay,
    SameEveryWeek,
    Leftovers,
    MealPrepSunday,
}

impl fmt::Display for Variety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Varied => "varied",
            Self::SameEveryDay => "same_every_day",
            Self::SameEveryWeek => "same_every_week",
            Self::Leftovers => "leftovers",
            Self::MealPrepSunday => "meal_prep_sunday",
        };
        f.write_str(s)
    }
}

impl FromStr for Variety {
    type Err = VarietyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "varied" => Ok(Self::Varied),
            "same_every_day" => Ok(Self::SameEveryDay),
            "same_every_week" => Ok(Self::SameEveryWeek),
            "leftovers" => Ok(Self::Leftovers),
            "meal_prep_sunday" => Ok(Self::MealPrepSunday),
            other => Err(VarietyParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Variety`] string.
#[derive(Debug, Clone)]
pub struct VarietyParseError(pub String);

impl fmt::Display for VarietyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid variety policy: {:?}", self.0)
    }
}

impl std::error::Error for VarietyParseError {}

// ---------------------------------------------------------------------------

/// One meal occasion within a day.
///
/// The derived ordering is the canonical slot order used when rendering a
/// day and when normalizing a requested slot set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl TimeSlot {
    /// All slots in canonical order.
    pub const ALL: [TimeSlot; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

    /// Capitalized label for rendering ("Breakfast", "Lunch", ...).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
            Self::Snack => "Snack",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        };
        f.write_str(s)
    }
}

impl FromStr for TimeSlot {
    type Err = TimeSlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" => Ok(Self::Snack),
            other => Err(TimeSlotParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`TimeSlot`] string.
#[derive(Debug, Clone)]
pub struct TimeSlotParseError(pub String);

impl fmt::Display for TimeSlotParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid time slot: {:?}", self.0)
    }
}

impl std::error::Error for TimeSlotParseError {}

// ---------------------------------------------------------------------------

/// Which surface invoked the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Chat,
    Api,
    Scheduled,
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Chat => "chat",
            Self::Api => "api",
            Self::Scheduled => "scheduled",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanSource {
    type Err = PlanSourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Self::Chat),
            "api" => Ok(Self::Api),
            "scheduled" => Ok(Self::Scheduled),
            other => Err(PlanSourceParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanSource`] string.
#[derive(Debug, Clone)]
pub struct PlanSourceParseError(pub String);

impl fmt::Display for PlanSourceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan source: {:?}", self.0)
    }
}

impl std::error::Error for PlanSourceParseError {}

// ---------------------------------------------------------------------------
// Embedded plan structures (stored as JSONB)
// ---------------------------------------------------------------------------

/// A materialized slot: one meal occasion bound to a persisted recipe.
///
/// Serialized camelCase to match the wire format used by the AI service and
/// the HTTP API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotEntry {
    pub time_slot: TimeSlot,
    pub recipe_name: String,
    pub description: String,
    pub recipe_id: Uuid,
}

/// One day of a weekly plan.
///
/// `day` is 1..7 in canonical Monday-start order; `day_name` is the matching
/// label. This is a naming convention, not a binding to real calendar dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub day: i32,
    pub day_name: String,
    pub slots: Vec<SlotEntry>,
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A persisted meal plan, owned by the requesting user.
///
/// Plans are immutable once written: re-invocation always creates a new row.
/// Weekly plans populate `days` and leave `slots` empty; daily plans do the
/// opposite.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: String,
    pub plan_type: PlanType,
    pub variety: Variety,
    pub days: Json<Vec<DayEntry>>,
    pub slots: Json<Vec<SlotEntry>>,
    pub baba_tip: String,
    pub shopping_list: Option<String>,
    pub source: PlanSource,
    pub created_at: DateTime<Utc>,
}

/// A recipe in the shared catalog.
///
/// Recipes are referenced (not owned) by plan slots and are never
/// deduplicated: every materialization mints a new row, even for a repeated
/// name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub recipe_title: String,
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
    pub cuisine_type: String,
    pub cooking_difficulty: String,
    pub cooking_time: String,
    pub diet: Vec<String>,
    pub origin: String,
    pub origin_description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Stored per-user defaults merged into incoming plan requests.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPreferences {
    pub user_id: String,
    pub dietary_preferences: Vec<String>,
    pub preferred_cooking_oil: Option<String>,
    pub calorie_target: Option<i32>,
    pub auto_plan: bool,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
