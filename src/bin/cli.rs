use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use jobdesk::utils::hash_password;

#[derive(Parser, Debug)]
#[command(author, version, about = "jobdesk maintenance tool", long_about = None)]
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
    /// Insert a demo company, seeker, postings and one application
    Seed,
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
        Commands::Seed => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            seed(&pool).await?;
        }
    }

    Ok(())
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let options = SqliteConnectOptions::from_str(&database_url)
        .context("invalid DATABASE_URL")?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("failed to connect to database")
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Try local ./migrations first (when running from repo root). If that
    // doesn't exist (common in containers where CWD differs), fall back to
    // the crate-local migrations folder determined by CARGO_MANIFEST_DIR.
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

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let table_exists: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;

    let applied_versions: HashSet<i64> = if table_exists.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter()
            .filter_map(|row| row.try_get::<i64, _>("version").ok())
            .collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let applied = applied_versions.contains(&migration.version);
        let status = if applied { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if !desc.is_empty() { desc } else { "unknown" };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}

const DEMO_COMPANY_EMAIL: &str = "demo-company@jobdesk.dev";
const DEMO_SEEKER_EMAIL: &str = "demo-seeker@jobdesk.dev";

async fn seed(pool: &SqlitePool) -> anyhow::Result<()> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email IN (?, ?)")
        .bind(DEMO_COMPANY_EMAIL)
        .bind(DEMO_SEEKER_EMAIL)
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        println!("Demo data already present, nothing to do");
        return Ok(());
    }

    let now = Utc::now();
    let password_hash = hash_password("demo-password").map_err(anyhow::Error::msg)?;

    let company_user_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, 'COMPANY', ?, ?)",
    )
    .bind(company_user_id)
    .bind("Demo Company Owner")
    .bind(DEMO_COMPANY_EMAIL)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let company_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO companies (id, user_id, name, description, website, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(company_id)
    .bind(company_user_id)
    .bind("Initech")
    .bind("We make TPS report software.")
    .bind("https://initech.example")
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let jobs = [
        ("Backend Engineer", "Own the ingestion pipeline.", "Berlin / remote", "FULL_TIME", Some("70k-90k EUR")),
        ("QA Contractor", "Break the release candidate.", "Remote", "CONTRACT", None),
    ];
    let mut first_job_id = None;
    for (title, description, location, job_type, salary) in jobs {
        let job_id = Uuid::new_v4();
        first_job_id.get_or_insert(job_id);
        sqlx::query(
            "INSERT INTO jobs (id, company_id, title, description, location, job_type, salary, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job_id)
        .bind(company_id)
        .bind(title)
        .bind(description)
        .bind(location)
        .bind(job_type)
        .bind(salary)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    let seeker_user_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, 'SEEKER', ?, ?)",
    )
    .bind(seeker_user_id)
    .bind("Demo Seeker")
    .bind(DEMO_SEEKER_EMAIL)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT INTO profiles (id, user_id, bio, skills, experience, education, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(seeker_user_id)
    .bind("Rust developer looking for backend roles.")
    .bind(r#"["Rust","SQL","Docker"]"#)
    .bind("4 years backend work")
    .bind("BSc Computer Science")
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    if let Some(job_id) = first_job_id {
        sqlx::query(
            "INSERT INTO applications (id, user_id, job_id, status, cover_letter, created_at) VALUES (?, ?, ?, 'PENDING', ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(seeker_user_id)
        .bind(job_id)
        .bind("I have shipped three ingestion pipelines.")
        .bind(now)
        .execute(pool)
        .await?;
    }

    println!("Seeded demo company ({DEMO_COMPANY_EMAIL}), seeker ({DEMO_SEEKER_EMAIL}), 2 jobs, 1 application");
    Ok(())
}
