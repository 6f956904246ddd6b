mod config;
mod plan_cmd;
mod prefs_cmd;
mod schedule_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use baba_core::ai::HttpRecipeAi;
use baba_db::pool;

use config::BabaConfig;

#[derive(Parser)]
#[command(name = "baba", about = "Meal-plan generation service")]
struct Cli {
    /// Database URL (overrides BABA_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a baba config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/baba")]
        db_url: String,
        /// Base URL of the generative recipe service
        #[arg(long)]
        ai_url: String,
        /// Bearer token for the generative recipe service
        #[arg(long)]
        ai_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the baba database (requires config file or env vars)
    DbInit,
    /// Meal plan generation and inspection
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Stored per-user preference defaults
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },
    /// Serve the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run the scheduled per-user plan job once
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate a meal plan interactively
    Generate {
        /// User to generate the plan for
        #[arg(long)]
        user: String,
        /// Free-text preference statement (diet, cuisine, time budget, ...)
        #[arg(long, default_value = "")]
        prompt: String,
        /// Plan type: weekly or daily
        #[arg(long = "type", default_value = "weekly")]
        plan_type: String,
        /// Variety policy: varied, same_every_day, same_every_week,
        /// leftovers, or meal_prep_sunday
        #[arg(long, default_value = "varied")]
        variety: String,
        /// Comma-separated slots (breakfast,lunch,dinner,snack); empty uses
        /// the default set
        #[arg(long, default_value = "")]
        slots: String,
        /// Ingredients already on hand
        #[arg(long)]
        ingredients: Option<String>,
        /// Daily calorie target
        #[arg(long)]
        calories: Option<i32>,
        /// Build a consolidated shopping list
        #[arg(long)]
        shopping_list: bool,
        /// Reuse last week's plan instead of generating (weekly only)
        #[arg(long)]
        reuse_last_week: bool,
    },
    /// Show a stored plan
    Show {
        /// Plan ID to show
        plan_id: String,
    },
    /// List a user's plans (newest first)
    List {
        /// User to list plans for
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// Set stored defaults for a user (unset flags keep current values)
    Set {
        /// User to update
        #[arg(long)]
        user: String,
        /// Comma-separated dietary preferences (e.g. "vegetarian,nut-free")
        #[arg(long)]
        diet: Option<String>,
        /// Preferred cooking oil
        #[arg(long)]
        oil: Option<String>,
        /// Daily calorie target
        #[arg(long)]
        calories: Option<i32>,
        /// Opt in/out of the scheduled weekly plan job
        #[arg(long)]
        auto_plan: Option<bool>,
    },
    /// Show a user's stored defaults
    Show {
        /// User to show
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Generate a plan for every opted-in user
    Run,
}

/// Execute the `baba init` command: write config file.
fn cmd_init(db_url: &str, ai_url: &str, ai_key: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        ai: config::AiSection {
            base_url: ai_url.to_string(),
            api_key: ai_key,
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  ai.base_url = {ai_url}");
    println!();
    println!("Next: run `baba db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `baba db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = BabaConfig::resolve(cli_db_url)?;

    println!("Initializing baba database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Print success with table counts.
    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    // 5. Clean shutdown.
    db_pool.close().await;

    println!("baba db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            ai_url,
            ai_key,
            force,
        } => {
            cmd_init(&db_url, &ai_url, ai_key, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Plan { command } => {
            let resolved = BabaConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let ai = HttpRecipeAi::new(resolved.ai_config)?;
            let result = plan_cmd::run_plan_command(command, &db_pool, &ai).await;
            db_pool.close().await;
            result?;
        }
        Commands::Prefs { command } => {
            let resolved = BabaConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = prefs_cmd::run_prefs_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved = BabaConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let ai = HttpRecipeAi::new(resolved.ai_config)?;
            let result = serve_cmd::run_serve(db_pool.clone(), std::sync::Arc::new(ai), &bind, port).await;
            db_pool.close().await;
            result?;
        }
        Commands::Schedule { command } => match command {
            ScheduleCommands::Run => {
                let resolved = BabaConfig::resolve(cli.database_url.as_deref())?;
                let db_pool = pool::create_pool(&resolved.db_config).await?;
                let ai = HttpRecipeAi::new(resolved.ai_config)?;
                let result = schedule_cmd::run_schedule(&db_pool, &ai).await;
                db_pool.close().await;
                result?;
            }
        },
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "baba", &mut std::io::stdout());
        }
    }

    Ok(())
}
