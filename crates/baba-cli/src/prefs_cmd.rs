//! Operator-mode CLI handlers for `baba prefs` subcommands.

use anyhow::Result;
use sqlx::PgPool;

use baba_db::queries::preferences::{self, NewPreferences};

use crate::PrefsCommands;

/// Dispatch a `PrefsCommands` variant to the appropriate handler.
pub async fn run_prefs_command(command: PrefsCommands, pool: &PgPool) -> Result<()> {
    match command {
        PrefsCommands::Set {
            user,
            diet,
            oil,
            calories,
            auto_plan,
        } => cmd_set(pool, &user, diet, oil, calories, auto_plan).await,
        PrefsCommands::Show { user } => cmd_show(pool, &user).await,
    }
}

/// Update a user's stored defaults. Flags that were not passed keep the
/// currently stored value.
async fn cmd_set(
    pool: &PgPool,
    user: &str,
    diet: Option<String>,
    oil: Option<String>,
    calories: Option<i32>,
    auto_plan: Option<bool>,
) -> Result<()> {
    let existing = preferences::get_preferences(pool, user).await?;

    let mut new = match existing {
        Some(prefs) => NewPreferences {
            user_id: prefs.user_id,
            dietary_preferences: prefs.dietary_preferences,
            preferred_cooking_oil: prefs.preferred_cooking_oil,
            calorie_target: prefs.calorie_target,
            auto_plan: prefs.auto_plan,
        },
        None => NewPreferences {
            user_id: user.to_string(),
            dietary_preferences: Vec::new(),
            preferred_cooking_oil: None,
            calorie_target: None,
            auto_plan: false,
        },
    };

    if let Some(diet) = diet {
        new.dietary_preferences = diet
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(oil) = oil {
        new.preferred_cooking_oil = Some(oil);
    }
    if let Some(calories) = calories {
        new.calorie_target = Some(calories);
    }
    if let Some(auto_plan) = auto_plan {
        new.auto_plan = auto_plan;
    }

    let stored = preferences::upsert_preferences(pool, &new).await?;

    println!("Preferences for {user} updated.");
    print_prefs(&stored);
    Ok(())
}

async fn cmd_show(pool: &PgPool, user: &str) -> Result<()> {
    match preferences::get_preferences(pool, user).await? {
        Some(prefs) => print_prefs(&prefs),
        None => println!("No stored preferences for {user}."),
    }
    Ok(())
}

fn print_prefs(prefs: &baba_db::models::UserPreferences) {
    let diet = if prefs.dietary_preferences.is_empty() {
        "(none)".to_string()
    } else {
        prefs.dietary_preferences.join(", ")
    };
    println!("  Dietary preferences: {diet}");
    println!(
        "  Preferred oil:       {}",
        prefs.preferred_cooking_oil.as_deref().unwrap_or("(none)")
    );
    match prefs.calorie_target {
        Some(target) => println!("  Calorie target:      {target}"),
        None => println!("  Calorie target:      (none)"),
    }
    println!("  Auto plan:           {}", prefs.auto_plan);
}
