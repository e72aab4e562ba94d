//! Settings tests against Postgres.

use super::common::*;
use clubhouse_runtime::ClubStore;

pub async fn test_club_name_singleton(ctx: &TestContext) {
    println!("  🧪 test_club_name_singleton");
    ctx.reset().await;

    let settings = &ctx.services.settings;
    assert_eq!(settings.club_name().await.unwrap(), None);

    settings.set_club_name("Athens Bridge Club").await.unwrap();
    settings.set_club_name("Όμιλος Μπριτζ Αθηνών").await.unwrap();
    assert_eq!(
        settings.club_name().await.unwrap().as_deref(),
        Some("Όμιλος Μπριτζ Αθηνών")
    );

    let rows: i64 = sqlx::query_scalar("SELECT count(*)::bigint FROM settings")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    println!("     ✓ Exactly one settings row after repeated saves");
}

pub async fn test_ping(ctx: &TestContext) {
    println!("  🧪 test_ping");
    ctx.services.store.ping().await.unwrap();
    println!("     ✓ Store reachable");
}

pub async fn run_all_tests(ctx: &TestContext) {
    println!("\n⚙️  Settings Tests");
    test_club_name_singleton(ctx).await;
    test_ping(ctx).await;
}
