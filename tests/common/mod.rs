#![allow(dead_code)]

use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;

pub async fn test_pool() -> Result<(SqlitePool, TempDir)> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"))
        .await?;
    migrator.run(&pool).await?;

    Ok((pool, dir))
}

pub async fn assign(pool: &SqlitePool, principal: &str, role: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO role_assignments (principal_id, role_name, created_at, created_by, notes) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(principal)
    .bind(role)
    .bind(Utc::now())
    .bind("test-setup")
    .bind(format!("{role} for {principal}"))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn revoke(pool: &SqlitePool, principal: &str, role: &str) -> Result<()> {
    sqlx::query("DELETE FROM role_assignments WHERE LOWER(TRIM(principal_id)) = LOWER(TRIM(?)) AND LOWER(role_name) = LOWER(?)")
        .bind(principal)
        .bind(role)
        .execute(pool)
        .await?;
    Ok(())
}
