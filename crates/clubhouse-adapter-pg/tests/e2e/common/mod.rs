//! Shared test infrastructure for the Postgres end-to-end tests.
//!
//! This module provides:
//! - Docker container management for PostgreSQL
//! - A context holding the store and the services built over it
//! - Table reset between test modules

use clubhouse_adapter_pg::{PostgresStore, PostgresStoreOptions};
use clubhouse_core::{Category, MemberDraft};
use clubhouse_runtime::{Services, SharedStore};
use sqlx::PgPool;
use std::collections::BTreeSet;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// DOCKER CONTAINER CONFIGURATION
// =============================================================================

pub const CONTAINER_NAME: &str = "clubhouse_test_postgres";
pub const POSTGRES_PORT: u16 = 5433;
pub const POSTGRES_PASSWORD: &str = "clubhouse_test_password";
pub const DATABASE_NAME: &str = "clubhouse_test";

pub fn database_url() -> String {
    format!(
        "postgres://postgres:{}@localhost:{}/{}",
        POSTGRES_PASSWORD, POSTGRES_PORT, DATABASE_NAME
    )
}

// =============================================================================
// DOCKER CONTAINER MANAGEMENT
// =============================================================================

/// Start a PostgreSQL container for testing
pub fn start_postgres_container() -> Result<(), String> {
    let output = Command::new("docker")
        .args(["ps", "-a", "-q", "-f", &format!("name={}", CONTAINER_NAME)])
        .output()
        .map_err(|e| format!("Failed to check existing container: {}", e))?;

    if !String::from_utf8_lossy(&output.stdout).trim().is_empty() {
        let _ = Command::new("docker")
            .args(["rm", "-f", CONTAINER_NAME])
            .output();
    }

    let status = Command::new("docker")
        .args([
            "run",
            "-d",
            "--name",
            CONTAINER_NAME,
            "-e",
            &format!("POSTGRES_PASSWORD={}", POSTGRES_PASSWORD),
            "-e",
            &format!("POSTGRES_DB={}", DATABASE_NAME),
            "-p",
            &format!("{}:5432", POSTGRES_PORT),
            "postgres:16-alpine",
        ])
        .status()
        .map_err(|e| format!("Failed to start container: {}", e))?;

    if !status.success() {
        return Err("Failed to start PostgreSQL container".to_string());
    }
    Ok(())
}

/// Stop and remove the PostgreSQL container
pub fn stop_postgres_container() {
    let _ = Command::new("docker")
        .args(["rm", "-f", CONTAINER_NAME])
        .output();
}

/// Wait for PostgreSQL to accept queries
pub async fn wait_for_postgres() -> Result<PgPool, String> {
    for attempt in 1..=30 {
        match PgPool::connect(&database_url()).await {
            Ok(pool) => {
                if sqlx::query("SELECT 1").fetch_one(&pool).await.is_ok() {
                    println!("✅ PostgreSQL ready after {} attempts", attempt);
                    return Ok(pool);
                }
            }
            Err(_) => {
                if attempt % 5 == 0 {
                    println!("⏳ Waiting for PostgreSQL... (attempt {})", attempt);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    Err("PostgreSQL did not become ready in time".to_string())
}

// =============================================================================
// TEST CONTEXT
// =============================================================================

pub struct TestContext {
    pub pool: PgPool,
    pub store: Arc<PostgresStore>,
    pub services: Services,
}

impl TestContext {
    pub async fn setup() -> Result<Self, String> {
        start_postgres_container()?;
        let pool = wait_for_postgres().await?;
        let store = Arc::new(
            PostgresStore::connect(&database_url(), PostgresStoreOptions::default())
                .await
                .map_err(|e| format!("Failed to open store: {}", e))?,
        );
        store
            .bootstrap()
            .await
            .map_err(|e| format!("Failed to create schema: {}", e))?;
        // Running the bootstrap twice must be harmless.
        store
            .bootstrap()
            .await
            .map_err(|e| format!("Second bootstrap failed: {}", e))?;

        let shared: SharedStore = store.clone();
        Ok(Self {
            pool,
            store,
            services: Services::new(shared),
        })
    }

    /// Empty every table and restart the id sequences.
    pub async fn reset(&self) {
        sqlx::raw_sql(
            "TRUNCATE member_attributes, people, custom_fields, settings RESTART IDENTITY CASCADE",
        )
        .execute(&self.pool)
        .await
        .expect("truncate tables");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        stop_postgres_container();
        println!("🧹 Cleaned up PostgreSQL container");
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub fn categories(list: &[Category]) -> BTreeSet<Category> {
    list.iter().copied().collect()
}

pub fn person(first: &str, last: &str, category: Category, email: Option<&str>) -> MemberDraft {
    let mut draft = MemberDraft::new(first, last, category);
    draft.email = email.map(str::to_string);
    draft
}

/// Number of rows in `member_attributes`, counted directly.
pub async fn attribute_rows(ctx: &TestContext) -> i64 {
    sqlx::query_scalar("SELECT count(*)::bigint FROM member_attributes")
        .fetch_one(&ctx.pool)
        .await
        .expect("count attributes")
}
