use sqlx::Row;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use opsdesk::authz::{AuthorizationEngine, Identity, RequestContext, Role, SqliteRoleDirectory};
use opsdesk::config::AuthzConfig;
use opsdesk::policies;

#[derive(Parser, Debug)]
#[command(author, version, about = "opsdesk operator tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Print the role catalog
    Roles,
    /// Print the operation policy table
    Policies,
    /// List principals currently holding a role
    Holders { role: String },
    /// Dry-run an authorization decision, e.g. `check alice "GET /roles/:role/holders"`
    Check {
        principal: String,
        operation: String,
        /// Request path used for the login return URL
        #[arg(long, default_value = "/")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD; when running in Docker the binary CWD may differ,
    // so fall back to the crate-local `.env` using CARGO_MANIFEST_DIR.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::Roles => {
            for role in Role::ALL {
                println!("{:<10} {}", role, role.description());
            }
        }
        Commands::Policies => {
            let registry = policies::default_registry(&AuthzConfig::from_env()?);
            let mut rows: Vec<_> = registry.operations().collect();
            rows.sort_by(|a, b| a.0.cmp(b.0));
            for (operation, policy) in rows {
                let requirement = if policy.allow_anonymous {
                    "anonymous".to_string()
                } else if policy.required_roles.is_empty() {
                    "authenticated".to_string()
                } else {
                    policy.required_roles.iter().cloned().collect::<Vec<_>>().join(" | ")
                };
                println!("{:<32} {}", operation, requirement);
            }
        }
        Commands::Holders { role } => {
            let role: Role = role.parse()?;
            let directory = SqliteRoleDirectory::new(get_pool().await?);
            let rows = directory.assignments_for_role(role.as_str()).await?;
            if rows.is_empty() {
                println!("no principal holds {}", role);
            }
            for row in rows {
                println!("{:<20} since {} by {}", row.principal_id, row.created_at, row.created_by);
            }
        }
        Commands::Check {
            principal,
            operation,
            path,
        } => {
            let config = AuthzConfig::from_env()?;
            let directory = Arc::new(SqliteRoleDirectory::new(get_pool().await?));
            let engine = AuthorizationEngine::new(
                Arc::new(policies::default_registry(&config)),
                directory,
                config.super_admins.clone(),
                config.directory_timeout,
            );

            let ctx = RequestContext::new(Identity::authenticated(principal), operation, path);
            let outcome = engine.evaluate(&ctx).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let db_applied = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    let applied_versions: HashSet<i64> = if db_applied.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let version = migration.version;
        let status = if applied_versions.contains(&version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if !desc.is_empty() { desc } else { "unknown" };
        println!("{:<8} {:<20} {}", status, version, name);
    }

    Ok(())
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations when run from the repo root, else the crate-local folder.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
