//! End-to-end tests using a Docker PostgreSQL container.
//!
//! Test modules are organized by feature area:
//! - `members` - member CRUD, filters, ordering, counts and duplicates
//! - `fields` - custom field definitions, applicability and cascades
//! - `settings` - the singleton club name row
//!
//! Run with:
//!   cargo test -p clubhouse-adapter-pg --test e2e -- --nocapture --test-threads=1
//!
//! Requirements:
//!   - Docker must be running
//!   - Port 5433 must be available

#[path = "e2e/common/mod.rs"]
mod common;

#[path = "e2e/fields.rs"]
mod fields;

#[path = "e2e/members.rs"]
mod members;

#[path = "e2e/settings.rs"]
mod settings;

use common::TestContext;

/// Run all E2E modules against one container.
#[tokio::test]
async fn e2e_all_tests() {
    println!("\n🚀 Starting Clubhouse Postgres End-to-End Tests\n");

    let ctx = match TestContext::setup().await {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("❌ Failed to setup test context: {}", e);
            eprintln!("   Make sure Docker is running and port 5433 is available");
            return;
        }
    };

    println!("\n📋 Running test modules...\n");

    members::run_all_tests(&ctx).await;
    fields::run_all_tests(&ctx).await;
    settings::run_all_tests(&ctx).await;

    ctx.store.close().await;
    println!("\n🎉 All E2E test modules passed!\n");
}
