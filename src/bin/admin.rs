//! CLI administration tool for user-api.
//!
//! Lists and imports users and performs database checks without going through
//! the HTTP API. Imports run the same validation pipeline as `POST /users/bulk`.
//!
//! # Usage
//!
//! ```bash
//! # List users whose name starts with "Ad"
//! cargo run --bin admin -- users list --keywords Ad --per-page 30
//!
//! # Import users from a JSON file (array of users, or {"users": [...]})
//! cargo run --bin admin -- users import users.json
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server: `DATABASE_URL` (or `DB_*`), `MX_CHECK_TIMEOUT_MS`.

use user_api::api::dto::user::BulkCreateUsersRequest;
use user_api::api::dto::user_list::ListUsersQuery;
use user_api::application::services::UserService;
use user_api::config::Config;
use user_api::domain::entities::NewUser;
use user_api::domain::mail::MailDomainVerifier;
use user_api::infrastructure::mail::{AcceptAllVerifier, DnsMxVerifier};
use user_api::infrastructure::persistence::PgUserRepository;
use user_api::server::connect_pool;
use user_api::validation::{FieldErrors, ValidationContext, validate_all};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use serde_json::Value;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI tool for managing user-api.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and import users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// User subcommands.
#[derive(Subcommand)]
enum UsersAction {
    /// List users, optionally filtered by name prefix
    List {
        /// Name prefix
        #[arg(short, long)]
        keywords: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Page size: 10, 30 or 50
        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },

    /// Validate and import users from a JSON file
    Import {
        /// JSON array of users, or an object with a `users` array
        file: PathBuf,

        /// Do not resolve MX records of email domains
        #[arg(long)]
        skip_mx: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    config.validate()?;

    let pool = connect_pool(&config).await?;

    match cli.command {
        Commands::Users { action } => handle_users_action(action, &pool, &config).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches user commands.
async fn handle_users_action(action: UsersAction, pool: &PgPool, config: &Config) -> Result<()> {
    let service = UserService::new(Arc::new(PgUserRepository::new(Arc::new(pool.clone()))));

    match action {
        UsersAction::List {
            keywords,
            page,
            per_page,
        } => list_users(&service, keywords, page, per_page).await?,
        UsersAction::Import { file, skip_mx, yes } => {
            let verifier: Arc<dyn MailDomainVerifier> = if skip_mx {
                Arc::new(AcceptAllVerifier::new())
            } else {
                Arc::new(DnsMxVerifier::from_system_conf(config.mx_check_timeout()))
            };
            import_users(&service, ValidationContext::new(verifier), file, yes).await?;
        }
    }

    Ok(())
}

/// Prints one page of users.
///
/// # Output Format
///
/// ```text
/// 👥 Users (page 1, 10 per page)
///
///   ID    Name                      Email                          Type
///   ─────────────────────────────────────────────────────────────────────
///   1     Ada Lovelace              ada@example.com                admin
/// ```
async fn list_users(
    service: &UserService,
    keywords: Option<String>,
    page: u32,
    per_page: u32,
) -> Result<()> {
    let query = ListUsersQuery {
        keywords: keywords
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()),
        page: Some(page.to_string()),
        per_page: Some(per_page.to_string()),
    };

    let ctx = ValidationContext::new(Arc::new(AcceptAllVerifier::new()));
    if let Err(errors) = validate_all(&query, &ctx).await {
        print_field_errors(&errors);
        anyhow::bail!("Invalid listing parameters");
    }

    let result = service
        .list_users(query.to_filter())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list users: {}", e))?;

    println!(
        "{}",
        format!("👥 Users (page {page}, {per_page} per page)")
            .bright_blue()
            .bold()
    );
    println!();

    if result.items.is_empty() {
        println!("{}", "  No users found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<25} {:<30} {:<6}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "Email".bright_white().bold(),
        "Type".bright_white().bold()
    );
    println!("  {}", "─".repeat(70).bright_black());

    for user in &result.items {
        println!(
            "  {:<5} {:<25} {:<30} {}",
            user.id.to_string().bright_black(),
            user.name.cyan(),
            user.email,
            user.role.to_string().green()
        );
    }

    println!();
    println!(
        "  Total matching: {}",
        result.total.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Validates a JSON file of users and stores them in one transaction.
///
/// # Flow
///
/// 1. Read and parse the file
/// 2. Run the bulk validation rules (including MX unless `--skip-mx`)
/// 3. Print every field error and stop, or
/// 4. Confirm (unless `--yes`) and insert atomically
async fn import_users(
    service: &UserService,
    ctx: ValidationContext,
    file: PathBuf,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "📥 Import users".bright_blue().bold());
    println!();

    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let request = parse_import(&raw).with_context(|| format!("Invalid JSON in {}", file.display()))?;

    println!("  Validating {} users...", request.users.len());

    if let Err(errors) = validate_all(&request, &ctx).await {
        print_field_errors(&errors);
        anyhow::bail!("Validation failed, nothing was imported");
    }

    let new_users =
        Vec::<NewUser>::try_from(request).map_err(|e| anyhow::anyhow!("Invalid input: {}", e))?;

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!("Import {} users?", new_users.len()))
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let created = service
        .create_users(new_users)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to import users: {}", e))?;

    println!();
    println!(
        "{}",
        format!("✅ Imported {} users", created.len()).green().bold()
    );
    println!();

    Ok(())
}

/// Accepts either `[...]` or `{"users": [...]}`.
fn parse_import(raw: &str) -> Result<BulkCreateUsersRequest> {
    let value: Value = serde_json::from_str(raw)?;
    let value = match value {
        Value::Array(_) => serde_json::json!({ "users": value }),
        other => other,
    };

    Ok(serde_json::from_value(value)?)
}

fn print_field_errors(errors: &FieldErrors) {
    println!("{}", "⚠️  Validation errors:".yellow().bold());
    for path in errors.paths() {
        for error in errors.get(path).unwrap_or_default() {
            println!(
                "  {} {} ({})",
                path.cyan(),
                error.message,
                error.code.bright_black()
            );
        }
    }
    println!();
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let users_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Users:      {}", users_count.to_string().bright_green().bold());
            println!();
        }
    }

    Ok(())
}
